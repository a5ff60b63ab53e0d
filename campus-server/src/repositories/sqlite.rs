use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Row, Sqlite};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::configs::Storage;
use crate::errors::StoreError;
use crate::query::{Clause, Direction, FindQuery, case_insensitive, project};

use super::{DocumentMeta, DocumentStore, document_type};

/// Document store on top of the `documents` table.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    storage: Arc<Storage>,
}

impl SqliteDocumentStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

/// Columns that mirror a document field and can be compared directly.
fn column_for(field: &str) -> Option<&'static str> {
    match field {
        "_id" => Some("id"),
        "type" => Some("doc_type"),
        _ => None,
    }
}

fn sort_column_for(field: &str) -> Option<&'static str> {
    match field {
        "createdAt" => Some("created_at"),
        other => column_for(other),
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

fn push_field(builder: &mut QueryBuilder<'_, Sqlite>, field: &str) {
    match column_for(field) {
        Some(column) => {
            builder.push(column);
        }
        None => {
            builder.push("json_extract(body, ");
            builder.push_bind(json_path(field));
            builder.push(")");
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::String(text) => {
            builder.push_bind(text.clone());
        }
        Value::Bool(flag) => {
            builder.push_bind(*flag);
        }
        Value::Number(number) => match number.as_i64() {
            Some(integer) => {
                builder.push_bind(integer);
            }
            None => {
                builder.push_bind(number.as_f64().unwrap_or_default());
            }
        },
        other => {
            builder.push_bind(other.to_string());
        }
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Sqlite>, clause: &Clause) {
    match clause {
        Clause::Eq {
            field,
            value: Value::Null,
        } => {
            push_field(builder, field);
            builder.push(" IS NULL");
        }
        Clause::Eq { field, value } => {
            push_field(builder, field);
            builder.push(" = ");
            push_value(builder, value);
        }
        Clause::Gt { field, value } => {
            push_field(builder, field);
            builder.push(" > ");
            push_value(builder, value);
        }
        Clause::Contains { field, needle } => {
            builder.push("coalesce(");
            push_field(builder, field);
            builder.push(", '') REGEXP ");
            builder.push_bind(case_insensitive(needle));
        }
        Clause::AnyContains { field, needle } => {
            builder.push("EXISTS (SELECT 1 FROM json_each(body, ");
            builder.push_bind(json_path(field));
            builder.push(") AS element WHERE element.type = 'text' AND element.value REGEXP ");
            builder.push_bind(case_insensitive(needle));
            builder.push(")");
        }
        Clause::Or(clauses) if clauses.is_empty() => {
            builder.push("0");
        }
        Clause::Or(clauses) => {
            builder.push("(");
            for (index, clause) in clauses.iter().enumerate() {
                if index > 0 {
                    builder.push(" OR ");
                }
                builder.push("(");
                push_clause(builder, clause);
                builder.push(")");
            }
            builder.push(")");
        }
    }
}

fn build_find<'args>(query: &FindQuery) -> QueryBuilder<'args, Sqlite> {
    let mut builder = QueryBuilder::new("SELECT rev, body FROM documents WHERE ");

    if query.selector.is_empty() {
        builder.push("1 = 1");
    }

    for (index, clause) in query.selector.clauses().iter().enumerate() {
        if index > 0 {
            builder.push(" AND ");
        }
        builder.push("(");
        push_clause(&mut builder, clause);
        builder.push(")");
    }

    builder.push(" ORDER BY ");
    for sort in &query.sort {
        match sort_column_for(&sort.field) {
            Some(column) => {
                builder.push(column);
            }
            None => {
                builder.push("json_extract(body, ");
                builder.push_bind(json_path(&sort.field));
                builder.push(")");
            }
        }
        builder.push(match sort.direction {
            Direction::Asc => " ASC, ",
            Direction::Desc => " DESC, ",
        });
    }
    // Newest insert first among equal keys, so repeated reads agree.
    builder.push("seq DESC");

    let limit = query
        .limit
        .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX))
        .unwrap_or(-1);
    let skip = query
        .skip
        .map(|skip| i64::try_from(skip).unwrap_or(i64::MAX))
        .unwrap_or(0);

    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(skip);

    builder
}

fn into_document(rev: i64, body: &str) -> Result<Value, StoreError> {
    let mut document: Value = serde_json::from_str(body)?;
    if let Value::Object(map) = &mut document {
        map.insert("_rev".into(), Value::String(rev.to_string()));
    }

    Ok(document)
}

/// Creation time in nanoseconds, read from `createdAt` when present.
fn created_at_of(map: &Map<String, Value>) -> i64 {
    let created_at = map
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|text| OffsetDateTime::parse(text, &Rfc3339).ok())
        .unwrap_or_else(OffsetDateTime::now_utc);

    i64::try_from(created_at.unix_timestamp_nanos()).unwrap_or(i64::MAX)
}

fn into_object(document: Value) -> Result<Map<String, Value>, StoreError> {
    match document {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidDocument("document is not an object".into())),
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, StoreError> {
        let mut builder = build_find(query);
        let rows = builder
            .build()
            .fetch_all(self.storage.get_pool())
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let rev: i64 = row.try_get("rev")?;
            let body: String = row.try_get("body")?;
            let document = into_document(rev, &body)?;

            documents.push(match &query.fields {
                Some(fields) => project(document, fields),
                None => document,
            });
        }

        Ok(documents)
    }

    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT rev, body FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        match row {
            Some(row) => {
                let rev: i64 = row.try_get("rev")?;
                let body: String = row.try_get("body")?;
                into_document(rev, &body).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn create(&self, document: Value) -> Result<DocumentMeta, StoreError> {
        let doc_type = document_type(&document)?.to_string();
        let mut map = into_object(document)?;

        let id = match map.get("_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().simple().to_string(),
        };
        map.insert("_id".into(), Value::String(id.clone()));
        map.remove("_rev");

        let created_at = created_at_of(&map);
        let body = serde_json::to_string(&map)?;

        let result = sqlx::query(
            r#"
            INSERT INTO documents (id, rev, doc_type, created_at, body)
            VALUES ($1, 1, $2, $3, $4)
            "#,
        )
        .bind(&id)
        .bind(&doc_type)
        .bind(created_at)
        .bind(&body)
        .execute(self.storage.get_pool())
        .await;

        match result {
            Ok(_) => Ok(DocumentMeta {
                id,
                rev: "1".into(),
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: &str, document: Value) -> Result<DocumentMeta, StoreError> {
        let doc_type = document_type(&document)?.to_string();
        let mut map = into_object(document)?;

        let expected_rev = map
            .remove("_rev")
            .and_then(|rev| rev.as_str().and_then(|rev| rev.parse::<i64>().ok()))
            .ok_or(StoreError::Conflict)?;
        map.insert("_id".into(), Value::String(id.to_string()));

        let created_at = created_at_of(&map);
        let body = serde_json::to_string(&map)?;

        let updated = sqlx::query(
            r#"
            UPDATE documents
            SET rev = rev + 1, doc_type = $1, created_at = $2, body = $3
            WHERE id = $4 AND rev = $5
            "#,
        )
        .bind(&doc_type)
        .bind(created_at)
        .bind(&body)
        .bind(id)
        .bind(expected_rev)
        .execute(self.storage.get_pool())
        .await?
        .rows_affected();

        if updated == 0 {
            let exists = sqlx::query("SELECT 1 FROM documents WHERE id = $1")
                .bind(id)
                .fetch_optional(self.storage.get_pool())
                .await?
                .is_some();

            return Err(if exists {
                StoreError::Conflict
            } else {
                StoreError::NotFound
            });
        }

        Ok(DocumentMeta {
            id: id.to_string(),
            rev: (expected_rev + 1).to_string(),
        })
    }
}
