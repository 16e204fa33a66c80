use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::account::models::UserId;
use crate::domain::action_token::errors::ActionTokenError;

/// What an action token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionPurpose {
    VerifyEmail,
    ResetPassword,
}

impl ActionPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPurpose::VerifyEmail => "verify_email",
            ActionPurpose::ResetPassword => "reset_password",
        }
    }
}

impl FromStr for ActionPurpose {
    type Err = ActionTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verify_email" => Ok(ActionPurpose::VerifyEmail),
            "reset_password" => Ok(ActionPurpose::ResetPassword),
            other => Err(ActionTokenError::Storage(format!(
                "unknown token purpose: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ActionPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque single-use secret delivered to the account owner.
///
/// Only its SHA-256 digest is persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct ActionTokenSecret(String);

impl ActionTokenSecret {
    const BYTES: usize = 32;

    /// Generate a fresh secret from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a secret presented by a caller.
    pub fn from_presented(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Hex-encoded SHA-256 digest used as the storage lookup key.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ActionTokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionTokenSecret(<redacted>)")
    }
}

/// Persisted action token record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub purpose: ActionPurpose,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl ActionToken {
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Decide whether the token may be consumed at `now`.
    ///
    /// A consumed token reports `AlreadyUsed` even after it has expired.
    pub fn check_consumable(&self, now: DateTime<Utc>) -> Result<(), ActionTokenError> {
        if self.is_consumed() {
            Err(ActionTokenError::AlreadyUsed)
        } else if self.is_expired(now) {
            Err(ActionTokenError::Expired)
        } else {
            Ok(())
        }
    }
}

/// Result of issuing a token: the secret to deliver and when it lapses.
#[derive(Debug, Clone)]
pub struct IssuedActionToken {
    pub secret: ActionTokenSecret,
    pub expires_at: DateTime<Utc>,
}
