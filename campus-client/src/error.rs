use serde_json::Value;

/// Message used when a failed response does not explain itself.
pub const FALLBACK_MESSAGE: &str = "Network response was not ok";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{message}")]
    RequestFailure { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// Builds a request failure from a non-2xx response body, preferring the
    /// server's `error.message`, then a top level `message`.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|body| {
                body.pointer("/error/message")
                    .or_else(|| body.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

        ClientError::RequestFailure { status, message }
    }
}
