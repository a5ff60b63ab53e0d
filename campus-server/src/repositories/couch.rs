use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::configs::CouchDb;
use crate::errors::StoreError;
use crate::query::{Clause, FindQuery, Selector, case_insensitive};

use super::{DocumentMeta, DocumentStore, document_type};

/// Page size used to walk an unlimited `_find` through bookmarks.
const SCAN_PAGE_SIZE: u64 = 200;

/// Document store backed by a CouchDB database over HTTP.
#[derive(Clone)]
pub struct CouchDocumentStore {
    client: Client,
    database_url: Url,
    username: Option<String>,
    password: Option<String>,
    scan_page_size: u64,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    docs: Vec<Value>,
    #[serde(default)]
    bookmark: Option<String>,
    #[serde(default)]
    warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    id: String,
    rev: String,
}

impl CouchDocumentStore {
    pub fn new(couch: CouchDb) -> Result<Self, StoreError> {
        let mut database_url =
            Url::parse(&couch.url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;

        database_url
            .path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(couch.url.clone()))?
            .pop_if_empty()
            .push(&couch.database);

        Ok(Self {
            client: Client::new(),
            database_url,
            username: couch.username,
            password: couch.password,
            scan_page_size: SCAN_PAGE_SIZE,
        })
    }

    pub fn with_scan_page_size(mut self, scan_page_size: u64) -> Self {
        self.scan_page_size = scan_page_size.max(1);
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.database_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);

        match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_ref()),
            None => builder,
        }
    }

    async fn find_page(
        &self,
        query: &FindQuery,
        skip: Option<u64>,
        limit: u64,
        bookmark: Option<&str>,
    ) -> Result<FindResponse, StoreError> {
        let body = find_body(query, skip, limit, bookmark);

        let response = self
            .request(Method::POST, self.endpoint(&["_find"]))
            .json(&body)
            .send()
            .await?;

        let page: FindResponse = check(response).await?.json().await?;
        if let Some(warning) = &page.warning {
            tracing::warn!("couchdb find warning: {}", warning);
        }

        Ok(page)
    }
}

fn field(name: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(name.to_string(), value);
    Value::Object(map)
}

fn clause_to_mango(clause: &Clause) -> Value {
    match clause {
        Clause::Eq { field: name, value } => field(name, value.clone()),
        Clause::Gt { field: name, value } => field(name, json!({ "$gt": value })),
        Clause::Contains { field: name, needle } => {
            field(name, json!({ "$regex": case_insensitive(needle) }))
        }
        Clause::AnyContains { field: name, needle } => field(
            name,
            json!({ "$elemMatch": { "$regex": case_insensitive(needle) } }),
        ),
        Clause::Or(clauses) => json!({
            "$or": clauses.iter().map(clause_to_mango).collect::<Vec<_>>()
        }),
    }
}

/// Compiles a selector into a Mango selector object.
pub fn to_mango(selector: &Selector) -> Value {
    let mut clauses: Vec<Value> = selector.clauses().iter().map(clause_to_mango).collect();

    match clauses.len() {
        0 => json!({}),
        1 => clauses.remove(0),
        _ => json!({ "$and": clauses }),
    }
}

fn find_body(query: &FindQuery, skip: Option<u64>, limit: u64, bookmark: Option<&str>) -> Value {
    let mut body = json!({
        "selector": to_mango(&query.selector),
        "limit": limit,
    });

    if !query.sort.is_empty() {
        body["sort"] = query
            .sort
            .iter()
            .map(|sort| field(&sort.field, json!(sort.direction.as_str())))
            .collect();
    }

    if let Some(skip) = skip {
        body["skip"] = json!(skip);
    }

    if let Some(fields) = &query.fields {
        body["fields"] = json!(fields);
    }

    if let Some(bookmark) = bookmark {
        body["bookmark"] = json!(bookmark);
    }

    body
}

async fn check(response: Response) -> Result<Response, StoreError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::CONFLICT => Err(StoreError::Conflict),
        StatusCode::NOT_FOUND => Err(StoreError::NotFound),
        status => Err(StoreError::Status {
            status: status.as_u16(),
            reason: response.text().await.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl DocumentStore for CouchDocumentStore {
    async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, StoreError> {
        if let Some(limit) = query.limit {
            return Ok(self.find_page(query, query.skip, limit, None).await?.docs);
        }

        // Mango applies a default limit, so an unlimited query is walked page by page.
        let mut documents = Vec::new();
        let mut bookmark: Option<String> = None;
        loop {
            let skip = if bookmark.is_none() { query.skip } else { None };
            let page = self
                .find_page(query, skip, self.scan_page_size, bookmark.as_deref())
                .await?;

            let exhausted = (page.docs.len() as u64) < self.scan_page_size;
            documents.extend(page.docs);

            match page.bookmark {
                Some(next) if !exhausted && bookmark.as_deref() != Some(next.as_str()) => {
                    bookmark = Some(next);
                }
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .request(Method::GET, self.endpoint(&[id]))
            .send()
            .await?;

        match check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, document: Value) -> Result<DocumentMeta, StoreError> {
        document_type(&document)?;

        let mut document = document;
        if let Value::Object(map) = &mut document {
            map.remove("_rev");
        }

        let request = match document.get("_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => self.request(Method::PUT, self.endpoint(&[id])),
            _ => {
                if let Value::Object(map) = &mut document {
                    map.remove("_id");
                }
                self.request(Method::POST, self.database_url.clone())
            }
        };

        let response = request.json(&document).send().await?;
        let written: WriteResponse = check(response).await?.json().await?;

        Ok(DocumentMeta {
            id: written.id,
            rev: written.rev,
        })
    }

    async fn update(&self, id: &str, document: Value) -> Result<DocumentMeta, StoreError> {
        document_type(&document)?;

        let response = self
            .request(Method::PUT, self.endpoint(&[id]))
            .json(&document)
            .send()
            .await?;
        let written: WriteResponse = check(response).await?.json().await?;

        Ok(DocumentMeta {
            id: written.id,
            rev: written.rev,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    use crate::query::Direction;

    use super::*;

    #[test]
    fn test_to_mango_search_selector() {
        let selector = Selector::new()
            .and(Clause::eq("type", "classroom"))
            .and(Clause::or(vec![
                Clause::contains("name", "c++"),
                Clause::any_contains("tags", "c++"),
            ]))
            .and(Clause::gt("stats.studentCount", 0));

        assert_eq!(
            to_mango(&selector),
            json!({
                "$and": [
                    { "type": "classroom" },
                    { "$or": [
                        { "name": { "$regex": "(?i)c\\+\\+" } },
                        { "tags": { "$elemMatch": { "$regex": "(?i)c\\+\\+" } } }
                    ] },
                    { "stats.studentCount": { "$gt": 0 } }
                ]
            })
        );
    }

    #[test]
    fn test_to_mango_single_clause_is_unwrapped() {
        let selector = Selector::new().and(Clause::eq("type", "community"));
        assert_eq!(to_mango(&selector), json!({ "type": "community" }));
        assert_eq!(to_mango(&Selector::new()), json!({}));
    }

    #[test]
    fn test_find_body_carries_sort_and_paging() {
        let query = FindQuery::new(Selector::new().and(Clause::eq("type", "classroom")))
            .sort("createdAt", Direction::Desc)
            .fields(&["category"]);

        let body = find_body(&query, Some(20), 10, Some("abc"));
        assert_eq!(body["sort"], json!([{ "createdAt": "desc" }]));
        assert_eq!(body["skip"], json!(20));
        assert_eq!(body["limit"], json!(10));
        assert_eq!(body["fields"], json!(["category"]));
        assert_eq!(body["bookmark"], json!("abc"));
    }

    #[test]
    fn test_new_appends_database_to_url() {
        let store = CouchDocumentStore::new(CouchDb {
            url: "http://127.0.0.1:5984/".into(),
            database: "campus".into(),
            username: None,
            password: None,
        })
        .unwrap();

        assert_eq!(
            store.endpoint(&["_find"]).as_str(),
            "http://127.0.0.1:5984/campus/_find"
        );
        assert_eq!(
            store.endpoint(&["a/b"]).as_str(),
            "http://127.0.0.1:5984/campus/a%2Fb"
        );
    }

    type Requests = Arc<Mutex<Vec<Value>>>;

    async fn paged_find(State(requests): State<Requests>, Json(body): Json<Value>) -> Json<Value> {
        let first_page = body.get("bookmark").is_none();
        requests.lock().unwrap().push(body);

        if first_page {
            Json(json!({
                "docs": [{ "category": "math" }, { "category": "art" }],
                "bookmark": "page-2"
            }))
        } else {
            Json(json!({ "docs": [{ "category": "science" }], "bookmark": "page-3" }))
        }
    }

    #[tokio::test]
    async fn test_unlimited_find_follows_bookmarks() {
        let requests: Requests = Arc::default();
        let app = Router::new()
            .route("/campus/_find", post(paged_find))
            .with_state(requests.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let store = CouchDocumentStore::new(CouchDb {
            url: format!("http://{address}"),
            database: "campus".into(),
            username: None,
            password: None,
        })
        .unwrap()
        .with_scan_page_size(2);

        let query = FindQuery::new(Selector::new().and(Clause::eq("type", "classroom")));
        let documents = store.find(&query).await.unwrap();

        assert_eq!(documents.len(), 3);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["limit"], json!(2));
        assert_eq!(requests[1]["bookmark"], json!("page-2"));
    }
}
