use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token issuer is misconfigured: {0}")]
    Configuration(String),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token claim is invalid: {0}")]
    InvalidClaim(String),

    #[error("Token is expired")]
    Expired,
}
