use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::account::errors::AuthError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountStatus;
use crate::domain::account::models::Role;
use crate::domain::account::models::UserId;
use crate::domain::account::ports::AccountRepository;
use crate::domain::account::ports::UserManagementPort;
use crate::domain::clock::Clock;

/// Administrative role and status changes.
///
/// Authorization is enforced by the caller; this service only applies changes.
pub struct UserManagementService<AR, C>
where
    AR: AccountRepository,
    C: Clock,
{
    accounts: Arc<AR>,
    clock: Arc<C>,
}

impl<AR, C> UserManagementService<AR, C>
where
    AR: AccountRepository,
    C: Clock,
{
    pub fn new(accounts: Arc<AR>, clock: Arc<C>) -> Self {
        Self { accounts, clock }
    }
}

#[async_trait]
impl<AR, C> UserManagementPort for UserManagementService<AR, C>
where
    AR: AccountRepository,
    C: Clock,
{
    async fn update_role(&self, id: &UserId, role: Role) -> Result<Account, AuthError> {
        let account = self
            .accounts
            .update_role(id, role, self.clock.now())
            .await?;
        tracing::info!(user_id = %id, role = %role, "Role updated");
        Ok(account)
    }

    async fn update_status(
        &self,
        id: &UserId,
        status: AccountStatus,
    ) -> Result<Account, AuthError> {
        let account = self
            .accounts
            .update_status(id, status, self.clock.now())
            .await?;
        tracing::info!(user_id = %id, status = %status, "Account status updated");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use chrono::TimeZone;
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::account::models::EmailAddress;
    use crate::domain::account::models::PersonName;
    use crate::domain::account::models::Username;

    mock! {
        pub TestAccountRepository {}

        #[async_trait]
        impl AccountRepository for TestAccountRepository {
            async fn create(&self, account: Account) -> Result<Account, AuthError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, AuthError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AuthError>;
            async fn update_password_hash(&self, id: &UserId, password_hash: &str, updated_at: DateTime<Utc>) -> Result<(), AuthError>;
            async fn mark_email_verified(&self, id: &UserId, updated_at: DateTime<Utc>) -> Result<(), AuthError>;
            async fn update_role(&self, id: &UserId, role: Role, updated_at: DateTime<Utc>) -> Result<Account, AuthError>;
            async fn update_status(&self, id: &UserId, status: AccountStatus, updated_at: DateTime<Utc>) -> Result<Account, AuthError>;
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn account(id: UserId, role: Role, status: AccountStatus) -> Account {
        Account {
            id,
            name: PersonName::new("Grace".to_string()).unwrap(),
            surname: PersonName::new("Hopper".to_string()).unwrap(),
            username: Username::new("grace".to_string()).unwrap(),
            email: EmailAddress::new("grace@x.com".to_string()).unwrap(),
            password_hash: "$argon2id$stub".to_string(),
            role,
            email_verified: true,
            status,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn test_update_role_stamps_current_time() {
        let mut accounts = MockTestAccountRepository::new();
        let user_id = UserId::new();

        accounts
            .expect_update_role()
            .with(eq(user_id), eq(Role::Admin), eq(now()))
            .times(1)
            .returning(|id, role, _| Ok(account(*id, role, AccountStatus::Active)));

        let service = UserManagementService::new(Arc::new(accounts), Arc::new(FixedClock(now())));

        let updated = service
            .update_role(&user_id, Role::Admin)
            .await
            .expect("Role update should succeed");
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_update_status_unknown_user() {
        let mut accounts = MockTestAccountRepository::new();

        accounts
            .expect_update_status()
            .returning(|id, _, _| Err(AuthError::NotFound(id.to_string())));

        let service = UserManagementService::new(Arc::new(accounts), Arc::new(FixedClock(now())));

        let result = service
            .update_status(&UserId::new(), AccountStatus::Disabled)
            .await;
        assert!(matches!(result, Err(AuthError::NotFound(_))));
    }
}
