use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use campus_api::UserRef;
use campus_server::app::create_router;
use campus_server::repositories::DocumentStore;
use campus_server::services::TokenService;
use campus_server::tests::{FailingStore, setup_test_store, test_auth, test_owner};
use serde_json::Value;
use tower::ServiceExt;

pub struct MockApp {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
    pub token_service: Arc<TokenService>,
    pub owner: UserRef,
    pub token: String,
}

impl MockApp {
    pub async fn new() -> Self {
        Self::with_store(Arc::new(setup_test_store().await))
    }

    /// App whose store fails every call.
    pub fn with_outage() -> Self {
        Self::with_store(Arc::new(FailingStore))
    }

    fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let token_service = Arc::new(TokenService::new(test_auth()));
        let owner = test_owner();
        let token = token_service.generate_token(&owner).unwrap().token;

        Self {
            router: create_router(store.clone(), token_service.clone()),
            store,
            token_service,
            owner,
            token,
        }
    }

    pub fn token_for(&self, user: &UserRef) -> String {
        self.token_service.generate_token(user).unwrap().token
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri).method(method);

        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(&self.token), None).await
    }

    pub async fn post(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(&self.token), body).await
    }
}

pub fn names(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|group| group["name"].as_str().unwrap().to_string())
        .collect()
}
