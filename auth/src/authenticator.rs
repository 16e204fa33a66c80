use chrono::DateTime;
use chrono::Utc;

use crate::jwt::AccessToken;
use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenIssuer;
use crate::jwt::TokenSettings;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `settings` - Signing secret, TTL, issuer/audience and leeway
    ///
    /// # Errors
    /// * `JwtError::Configuration` - Settings are unusable
    pub fn new(settings: TokenSettings) -> Result<Self, JwtError> {
        Ok(Self {
            password_hasher: PasswordHasher::new(),
            token_issuer: TokenIssuer::new(settings)?,
        })
    }

    /// Hash a password for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue an access token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is malformed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: impl ToString,
        roles: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.token_issuer.issue(subject, roles, now)?)
    }

    /// Issue an access token without password verification.
    ///
    /// Used once the caller has already established the subject's identity.
    pub fn issue_token(
        &self,
        subject: impl ToString,
        roles: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, JwtError> {
        self.token_issuer.issue(subject, roles, now)
    }

    /// Validate an access token at instant `now`.
    pub fn validate_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        self.token_issuer.validate(token, now)
    }
}
