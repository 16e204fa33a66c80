use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Access token claims.
///
/// Standard RFC 7519 registered claims plus the caller's role names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Role names granted to the subject
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    /// Create claims for a subject valid from `issued_at` for `ttl`.
    ///
    /// # Arguments
    /// * `subject` - Unique user identifier
    /// * `roles` - Role names to embed
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Token lifetime
    ///
    /// # Returns
    /// Claims with sub, roles, iat and exp set
    ///
    /// # Errors
    /// * `Configuration` - `issued_at + ttl` is not a representable instant
    pub fn for_subject(
        subject: impl ToString,
        roles: Vec<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            JwtError::Configuration("token ttl overflows the expiry instant".to_string())
        })?;

        Ok(Self {
            sub: subject.to_string(),
            roles,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: None,
            aud: None,
        })
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: Option<String>) -> Self {
        self.iss = iss;
        self
    }

    /// Set audience.
    pub fn with_audience(mut self, aud: Option<String>) -> Self {
        self.aud = aud;
        self
    }

    /// Check whether the subject holds a role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if token is expired at `current_timestamp`, tolerating `leeway_seconds`.
    pub fn is_expired(&self, current_timestamp: i64, leeway_seconds: i64) -> bool {
        current_timestamp >= self.exp.saturating_add(leeway_seconds)
    }
}
