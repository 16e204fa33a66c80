use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::account::models::UserId;
use crate::domain::action_token::errors::ActionTokenError;
use crate::domain::action_token::models::ActionPurpose;
use crate::domain::action_token::models::ActionToken;
use crate::domain::action_token::models::IssuedActionToken;

/// Port for issuing and redeeming single-use action tokens.
#[async_trait]
pub trait ActionTokenStore: Send + Sync + 'static {
    /// Issue a token for `user_id`, replacing any outstanding token of the same purpose.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the token
    /// * `purpose` - Email verification or password reset
    /// * `now` - Issuance instant; expiry is `now` plus the purpose's TTL
    ///
    /// # Returns
    /// The secret to deliver and its expiry
    ///
    /// # Errors
    /// * `Storage` - Persistence failed
    async fn issue(
        &self,
        user_id: &UserId,
        purpose: ActionPurpose,
        now: DateTime<Utc>,
    ) -> Result<IssuedActionToken, ActionTokenError>;

    /// Redeem a token exactly once.
    ///
    /// # Arguments
    /// * `secret` - Token value presented by the caller
    /// * `purpose` - Purpose the caller is redeeming it for
    /// * `now` - Redemption instant
    ///
    /// # Returns
    /// Owner of the token
    ///
    /// # Errors
    /// * `NotFound` - No token with this value and purpose
    /// * `AlreadyUsed` - Token was consumed before
    /// * `Expired` - `now` is at or past the token's expiry
    /// * `Storage` - Persistence failed
    async fn consume(
        &self,
        secret: &str,
        purpose: ActionPurpose,
        now: DateTime<Utc>,
    ) -> Result<UserId, ActionTokenError>;

    /// Delete tokens that expired at or before `now`.
    ///
    /// # Returns
    /// Number of deleted tokens
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ActionTokenError>;
}

/// Persistence operations for action tokens.
///
/// Implementations must make `upsert_outstanding` and `consume` atomic per
/// token: concurrent consumption of one token yields exactly one success.
#[async_trait]
pub trait ActionTokenRepository: Send + Sync + 'static {
    /// Store `token` as the single outstanding token for its (user, purpose) pair,
    /// replacing the previous outstanding one if any.
    ///
    /// # Errors
    /// * `Storage` - Database operation failed
    async fn upsert_outstanding(&self, token: ActionToken) -> Result<ActionToken, ActionTokenError>;

    /// Mark the token with `token_hash` consumed at `now` if it is still consumable.
    ///
    /// # Returns
    /// Owner of the token
    ///
    /// # Errors
    /// * `NotFound` - No token with this hash and purpose
    /// * `AlreadyUsed` - Token was consumed before
    /// * `Expired` - Token expired at or before `now`
    /// * `Storage` - Database operation failed
    async fn consume(
        &self,
        token_hash: &str,
        purpose: ActionPurpose,
        now: DateTime<Utc>,
    ) -> Result<UserId, ActionTokenError>;

    /// Delete tokens whose expiry is at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ActionTokenError>;
}
