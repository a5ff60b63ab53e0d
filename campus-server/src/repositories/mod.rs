mod couch;
mod sqlite;

pub use couch::CouchDocumentStore;
pub use sqlite::SqliteDocumentStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;
use crate::query::FindQuery;

/// Identity of a document after a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub id: String,
    pub rev: String,
}

/// JSON document storage queried through typed selectors.
///
/// Documents always carry a string `type` field. Reads return `_id` and
/// `_rev` inside the document; writes with a stale `_rev` fail with
/// [`StoreError::Conflict`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError>;

    async fn create(&self, document: Value) -> Result<DocumentMeta, StoreError>;

    async fn update(&self, id: &str, document: Value) -> Result<DocumentMeta, StoreError>;
}

fn document_type(document: &Value) -> Result<&str, StoreError> {
    document
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument("missing string field `type`".into()))
}
