use thiserror::Error;

/// Failure to issue or consume an action token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionTokenError {
    #[error("Token not found")]
    NotFound,

    #[error("Token has expired")]
    Expired,

    #[error("Token has already been used")]
    AlreadyUsed,

    #[error("Token storage error: {0}")]
    Storage(String),
}
