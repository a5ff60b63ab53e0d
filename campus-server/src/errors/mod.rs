pub mod api;
pub mod auth;
pub mod group;
pub mod store;

pub use api::ApiError;
pub use auth::AuthError;
pub use group::{GroupError, QueryAction};
pub use store::StoreError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

fn internal_error(
    kind: &str,
    error: &dyn std::fmt::Display,
) -> (StatusCode, String, Option<String>) {
    let error_id = Uuid::new_v4();
    tracing::error!(error_id = ?error_id, "{}: {}", kind, error);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
        Some(error_id.to_string()),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_id) = match self {
            ApiError::AuthError(e) => (e.status_code(), e.to_string(), None),
            ApiError::GroupError(GroupError::Store(StoreError::Conflict)) => (
                StatusCode::CONFLICT,
                StoreError::Conflict.to_string(),
                None,
            ),
            ApiError::GroupError(GroupError::Store(e)) => internal_error("Store error", &e),
            ApiError::GroupError(e) => (e.status_code(), e.to_string(), None),
        };

        let mut error_obj = json!({
            "code": status.as_u16(),
            "message": error_message
        });

        if let Some(error_id) = error_id {
            error_obj["error_id"] = json!(error_id);
        }

        let body = Json(json!({
            "error": error_obj
        }));

        (status, body).into_response()
    }
}
