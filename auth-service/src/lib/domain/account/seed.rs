use std::sync::Arc;

use auth::Authenticator;

use crate::domain::account::errors::AuthError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountStatus;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::Password;
use crate::domain::account::models::PersonName;
use crate::domain::account::models::Role;
use crate::domain::account::models::UserId;
use crate::domain::account::models::Username;
use crate::domain::account::ports::AccountRepository;
use crate::domain::clock::Clock;

/// Validated administrator account to create on first start.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: PersonName,
    pub surname: PersonName,
    pub username: Username,
    pub email: EmailAddress,
    pub password: Password,
}

impl AdminSeed {
    /// # Errors
    /// * `InvalidName` / `InvalidUsername` / `InvalidEmail` / `InvalidPassword` -
    ///   A configured field fails validation
    pub fn new(
        name: String,
        surname: String,
        username: String,
        email: String,
        password: String,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            name: PersonName::new(name)?,
            surname: PersonName::new(surname)?,
            username: Username::new(username)?,
            email: EmailAddress::new(email)?,
            password: Password::new(password)?,
        })
    }
}

/// What `ensure_seeded` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
    Skipped,
}

/// Idempotent startup seeding of the administrator account.
pub struct AccountSeeder<AR, C>
where
    AR: AccountRepository,
    C: Clock,
{
    accounts: Arc<AR>,
    clock: Arc<C>,
    authenticator: Arc<Authenticator>,
    admin: Option<AdminSeed>,
}

impl<AR, C> AccountSeeder<AR, C>
where
    AR: AccountRepository,
    C: Clock,
{
    pub fn new(
        accounts: Arc<AR>,
        clock: Arc<C>,
        authenticator: Arc<Authenticator>,
        admin: Option<AdminSeed>,
    ) -> Self {
        Self {
            accounts,
            clock,
            authenticator,
            admin,
        }
    }

    /// Create the configured administrator unless an account with its email exists.
    ///
    /// Safe to call repeatedly and from concurrent instances.
    ///
    /// # Errors
    /// * `UsernameTaken` - Another account holds the configured username
    /// * `Storage` - Database operation failed
    pub async fn ensure_seeded(&self) -> Result<SeedOutcome, AuthError> {
        let Some(admin) = &self.admin else {
            tracing::debug!("No admin seed configured");
            return Ok(SeedOutcome::Skipped);
        };

        if self.accounts.find_by_email(&admin.email).await?.is_some() {
            tracing::debug!(email = %admin.email, "Admin account already present");
            return Ok(SeedOutcome::AlreadyPresent);
        }

        let password_hash = self.authenticator.hash_password(admin.password.expose())?;
        let now = self.clock.now();
        let account = Account {
            id: UserId::new(),
            name: admin.name.clone(),
            surname: admin.surname.clone(),
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            role: Role::Admin,
            email_verified: true,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };

        match self.accounts.create(account).await {
            Ok(created) => {
                tracing::info!(user_id = %created.id, email = %created.email, "Admin account seeded");
                Ok(SeedOutcome::Created)
            }
            // Lost a race with another instance
            Err(AuthError::EmailTaken(_)) => Ok(SeedOutcome::AlreadyPresent),
            Err(e) => Err(e),
        }
    }
}
