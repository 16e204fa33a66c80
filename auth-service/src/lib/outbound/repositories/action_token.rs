use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::models::UserId;
use crate::domain::action_token::errors::ActionTokenError;
use crate::domain::action_token::models::ActionPurpose;
use crate::domain::action_token::models::ActionToken;
use crate::domain::action_token::ports::ActionTokenRepository;

#[derive(sqlx::FromRow)]
struct ActionTokenRow {
    id: Uuid,
    user_id: Uuid,
    purpose: String,
    token_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ActionTokenRow> for ActionToken {
    type Error = ActionTokenError;

    fn try_from(r: ActionTokenRow) -> Result<Self, Self::Error> {
        Ok(ActionToken {
            id: r.id,
            user_id: UserId(r.user_id),
            purpose: r.purpose.parse::<ActionPurpose>()?,
            token_hash: r.token_hash,
            created_at: r.created_at,
            expires_at: r.expires_at,
            consumed_at: r.consumed_at,
        })
    }
}

fn storage_error(e: sqlx::Error) -> ActionTokenError {
    ActionTokenError::Storage(e.to_string())
}

pub struct PostgresActionTokenRepository {
    pool: PgPool,
}

impl PostgresActionTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActionTokenRepository for PostgresActionTokenRepository {
    async fn upsert_outstanding(&self, token: ActionToken) -> Result<ActionToken, ActionTokenError> {
        // One outstanding row per (user, purpose); the previous value is overwritten in place
        let row = sqlx::query_as::<_, ActionTokenRow>(
            r#"
            INSERT INTO action_tokens (id, user_id, purpose, token_hash, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, purpose) WHERE consumed_at IS NULL
            DO UPDATE SET token_hash = EXCLUDED.token_hash,
                          created_at = EXCLUDED.created_at,
                          expires_at = EXCLUDED.expires_at
            RETURNING id, user_id, purpose, token_hash, created_at, expires_at, consumed_at
            "#,
        )
        .bind(token.id)
        .bind(token.user_id.0)
        .bind(token.purpose.as_str())
        .bind(&token.token_hash)
        .bind(token.created_at)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        ActionToken::try_from(row)
    }

    async fn consume(
        &self,
        token_hash: &str,
        purpose: ActionPurpose,
        now: DateTime<Utc>,
    ) -> Result<UserId, ActionTokenError> {
        let consumed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE action_tokens
            SET consumed_at = $3
            WHERE token_hash = $1
              AND purpose = $2
              AND consumed_at IS NULL
              AND expires_at > $3
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        if let Some(user_id) = consumed {
            return Ok(UserId(user_id));
        }

        let row = sqlx::query_as::<_, ActionTokenRow>(
            r#"
            SELECT id, user_id, purpose, token_hash, created_at, expires_at, consumed_at
            FROM action_tokens
            WHERE token_hash = $1 AND purpose = $2
            "#,
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or(ActionTokenError::NotFound)?;

        // The conditional update already failed, so a consumable row here
        // can only mean it was replaced in between.
        ActionToken::try_from(row)?.check_consumable(now)?;
        Err(ActionTokenError::NotFound)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ActionTokenError> {
        let result = sqlx::query("DELETE FROM action_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected())
    }
}
