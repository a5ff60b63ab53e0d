#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected store response {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found")]
    NotFound,

    #[error("Document update conflict")]
    Conflict,

    #[error("Invalid store url: {0}")]
    InvalidUrl(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
