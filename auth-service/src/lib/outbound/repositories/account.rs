use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::errors::AuthError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountStatus;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::PersonName;
use crate::domain::account::models::Role;
use crate::domain::account::models::UserId;
use crate::domain::account::models::Username;
use crate::domain::account::ports::AccountRepository;

const ACCOUNT_COLUMNS: &str = "id, name, surname, username, email, password_hash, role, \
                               email_verified, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    surname: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    email_verified: bool,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AuthError;

    fn try_from(r: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: UserId(r.id),
            name: PersonName::new(r.name)?,
            surname: PersonName::new(r.surname)?,
            username: Username::new(r.username)?,
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            role: r.role.parse::<Role>()?,
            email_verified: r.email_verified,
            status: r.status.parse::<AccountStatus>()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, surname, username, email, password_hash, role,
                                  email_verified, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(account.id.0)
        .bind(account.name.as_str())
        .bind(account.surname.as_str())
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.email_verified)
        .bind(account.status.as_str())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    if db_err.constraint() == Some("accounts_username_key") {
                        return AuthError::UsernameTaken(account.username.as_str().to_string());
                    }
                    if db_err.constraint() == Some("accounts_email_key") {
                        return AuthError::EmailTaken(account.email.as_str().to_string());
                    }
                }
            }
            AuthError::Storage(e.to_string())
        })?;

        Ok(account)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, AuthError> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, AccountRow>(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AuthError> {
        let query = format!("SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, AccountRow>(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .map(Account::try_from)
            .transpose()
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn mark_email_verified(
        &self,
        id: &UserId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email_verified = TRUE, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn update_role(
        &self,
        id: &UserId,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, AuthError> {
        let query = format!(
            "UPDATE accounts SET role = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&query)
            .bind(id.0)
            .bind(role.as_str())
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or(AuthError::NotFound(id.to_string()))
            .and_then(Account::try_from)
    }

    async fn update_status(
        &self,
        id: &UserId,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, AuthError> {
        let query = format!(
            "UPDATE accounts SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&query)
            .bind(id.0)
            .bind(status.as_str())
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or(AuthError::NotFound(id.to_string()))
            .and_then(Account::try_from)
    }
}
