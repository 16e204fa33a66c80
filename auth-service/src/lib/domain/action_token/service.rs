use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::account::models::UserId;
use crate::domain::action_token::errors::ActionTokenError;
use crate::domain::action_token::models::ActionPurpose;
use crate::domain::action_token::models::ActionToken;
use crate::domain::action_token::models::ActionTokenSecret;
use crate::domain::action_token::models::IssuedActionToken;
use crate::domain::action_token::ports::ActionTokenRepository;
use crate::domain::action_token::ports::ActionTokenStore;

/// Lifetimes of the two token purposes.
#[derive(Debug, Clone, Copy)]
pub struct ActionTokenTtl {
    pub verify_email: Duration,
    pub reset_password: Duration,
}

impl ActionTokenTtl {
    pub fn for_purpose(&self, purpose: ActionPurpose) -> Duration {
        match purpose {
            ActionPurpose::VerifyEmail => self.verify_email,
            ActionPurpose::ResetPassword => self.reset_password,
        }
    }
}

/// Action token store backed by an `ActionTokenRepository`.
pub struct ActionTokenService<TR>
where
    TR: ActionTokenRepository,
{
    repository: Arc<TR>,
    ttl: ActionTokenTtl,
}

impl<TR> ActionTokenService<TR>
where
    TR: ActionTokenRepository,
{
    pub fn new(repository: Arc<TR>, ttl: ActionTokenTtl) -> Self {
        Self { repository, ttl }
    }
}

#[async_trait]
impl<TR> ActionTokenStore for ActionTokenService<TR>
where
    TR: ActionTokenRepository,
{
    async fn issue(
        &self,
        user_id: &UserId,
        purpose: ActionPurpose,
        now: DateTime<Utc>,
    ) -> Result<IssuedActionToken, ActionTokenError> {
        let secret = ActionTokenSecret::generate();
        let record = ActionToken {
            id: Uuid::new_v4(),
            user_id: *user_id,
            purpose,
            token_hash: secret.digest(),
            created_at: now,
            expires_at: now + self.ttl.for_purpose(purpose),
            consumed_at: None,
        };

        let stored = self.repository.upsert_outstanding(record).await?;
        tracing::debug!(
            user_id = %user_id,
            purpose = %purpose,
            expires_at = %stored.expires_at,
            "Action token issued"
        );

        Ok(IssuedActionToken {
            secret,
            expires_at: stored.expires_at,
        })
    }

    async fn consume(
        &self,
        secret: &str,
        purpose: ActionPurpose,
        now: DateTime<Utc>,
    ) -> Result<UserId, ActionTokenError> {
        if secret.is_empty() {
            return Err(ActionTokenError::NotFound);
        }

        let token_hash = ActionTokenSecret::from_presented(secret).digest();
        let result = self.repository.consume(&token_hash, purpose, now).await;

        match &result {
            Ok(user_id) => tracing::debug!(user_id = %user_id, purpose = %purpose, "Action token consumed"),
            Err(e) => tracing::info!(purpose = %purpose, error = %e, "Action token rejected"),
        }

        result
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ActionTokenError> {
        self.repository.purge_expired(now).await
    }
}
