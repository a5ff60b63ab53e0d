use super::{AuthError, GroupError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Group error: {0}")]
    GroupError(#[from] GroupError),
}
