use thiserror::Error;

use crate::domain::action_token::errors::ActionTokenError;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for plaintext password policy failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Password must contain at least one letter and one digit")]
    MissingCharacterClass,
}

/// Error for name/surname validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersonNameError {
    #[error("Name must not be blank")]
    Blank,

    #[error("Name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for role and status parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown account status: {0}")]
    UnknownStatus(String),
}

/// Error for outbound email delivery
#[derive(Debug, Clone, Error)]
pub enum EmailSendError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email message: {0}")]
    Message(String),

    #[error("Email transport failed: {0}")]
    Transport(String),
}

/// Top-level error for all authentication and account operations
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] PersonNameError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Domain-level errors
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("User not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    ActionToken(#[from] ActionTokenError),

    // Infrastructure errors
    #[error("Credential error: {0}")]
    Credential(#[from] auth::PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] auth::JwtError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<AttributeError> for AuthError {
    fn from(err: AttributeError) -> Self {
        match err {
            // A stored row carrying an unknown attribute is a storage problem
            AttributeError::UnknownRole(_) | AttributeError::UnknownStatus(_) => {
                AuthError::Storage(err.to_string())
            }
        }
    }
}
