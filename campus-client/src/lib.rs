mod error;
mod group_client;

pub use error::*;
pub use group_client::*;

/// Where the client sends its requests and how it authenticates.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:3000`
    pub base_url: String,
    /// Bearer token attached to every request
    pub token: Option<String>,
}
