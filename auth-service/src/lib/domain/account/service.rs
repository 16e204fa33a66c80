use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;

use crate::domain::account::errors::AuthError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountStatus;
use crate::domain::account::models::AuthSession;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::models::RegisterCommand;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::models::Role;
use crate::domain::account::models::UserId;
use crate::domain::account::ports::AccountRepository;
use crate::domain::account::ports::AuthServicePort;
use crate::domain::account::ports::EmailSender;
use crate::domain::action_token::models::ActionPurpose;
use crate::domain::action_token::ports::ActionTokenStore;
use crate::domain::clock::Clock;

/// Argon2id hash with default cost parameters and an all-zero digest.
///
/// Login verifies against it when the email is unknown.
const UNKNOWN_ACCOUNT_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Deployment-level login policy.
#[derive(Debug, Clone, Copy)]
pub struct AuthPolicy {
    pub require_verified_email: bool,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            require_verified_email: true,
        }
    }
}

/// Domain service implementation for the authentication workflow.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<AR, TS, ES, C>
where
    AR: AccountRepository,
    TS: ActionTokenStore,
    ES: EmailSender,
    C: Clock,
{
    accounts: Arc<AR>,
    action_tokens: Arc<TS>,
    email_sender: Arc<ES>,
    clock: Arc<C>,
    authenticator: Arc<Authenticator>,
    policy: AuthPolicy,
}

impl<AR, TS, ES, C> AuthService<AR, TS, ES, C>
where
    AR: AccountRepository,
    TS: ActionTokenStore,
    ES: EmailSender,
    C: Clock,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `accounts` - Account persistence implementation
    /// * `action_tokens` - Verification and reset token store
    /// * `email_sender` - Outbound delivery of action tokens
    /// * `clock` - Source of the current instant
    /// * `authenticator` - Password hashing and access token issuance
    /// * `policy` - Login policy
    pub fn new(
        accounts: Arc<AR>,
        action_tokens: Arc<TS>,
        email_sender: Arc<ES>,
        clock: Arc<C>,
        authenticator: Arc<Authenticator>,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            accounts,
            action_tokens,
            email_sender,
            clock,
            authenticator,
            policy,
        }
    }

    /// Issue a fresh action token for `account` and hand it to the mailer.
    ///
    /// Storage failures propagate. Delivery runs on a detached task so the
    /// caller never waits on SMTP; its failures are only logged.
    async fn issue_and_send(&self, account: &Account, purpose: ActionPurpose) -> Result<(), AuthError> {
        let issued = self
            .action_tokens
            .issue(&account.id, purpose, self.clock.now())
            .await?;

        let email_sender = Arc::clone(&self.email_sender);
        let user_id = account.id;
        let to = account.email.clone();

        tokio::spawn(async move {
            let delivery = match purpose {
                ActionPurpose::VerifyEmail => {
                    email_sender
                        .send_verification_email(&to, &issued.secret)
                        .await
                }
                ActionPurpose::ResetPassword => {
                    email_sender
                        .send_password_reset_email(&to, &issued.secret)
                        .await
                }
            };

            if let Err(e) = delivery {
                tracing::error!(
                    user_id = %user_id,
                    purpose = %purpose,
                    error = %e,
                    "Failed to send action token email"
                );
            }
        });

        Ok(())
    }
}

#[async_trait]
impl<AR, TS, ES, C> AuthServicePort for AuthService<AR, TS, ES, C>
where
    AR: AccountRepository,
    TS: ActionTokenStore,
    ES: EmailSender,
    C: Clock,
{
    async fn register(&self, command: RegisterCommand) -> Result<Account, AuthError> {
        if self.accounts.find_by_email(&command.email).await?.is_some() {
            return Err(AuthError::EmailTaken(command.email.to_string()));
        }

        let password_hash = self
            .authenticator
            .hash_password(command.password.expose())?;

        let now = self.clock.now();
        let account = Account {
            id: UserId::new(),
            name: command.name,
            surname: command.surname,
            username: command.username,
            email: command.email,
            password_hash,
            role: Role::User,
            email_verified: false,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let created = self.accounts.create(account).await?;
        tracing::info!(user_id = %created.id, "Account registered");

        // The account stays usable through resend_verification if this fails
        if let Err(e) = self
            .issue_and_send(&created, ActionPurpose::VerifyEmail)
            .await
        {
            tracing::error!(
                user_id = %created.id,
                error = %e,
                "Failed to issue verification token for new account"
            );
        }

        Ok(created)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError> {
        let account = self.accounts.find_by_email(&command.email).await?;

        // Unknown emails pay for one verification as well
        let stored_hash = account
            .as_ref()
            .map_or(UNKNOWN_ACCOUNT_HASH, |account| account.password_hash.as_str());
        let password_matches = self
            .authenticator
            .verify_password(&command.password, stored_hash)?;

        let account = match account {
            Some(account) if password_matches => account,
            _ => return Err(AuthError::InvalidCredentials),
        };

        if !account.is_active() {
            return Err(AuthError::AccountDisabled);
        }

        if self.policy.require_verified_email && !account.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let access_token = self
            .authenticator
            .issue_token(account.id, account.role_names(), self.clock.now())?;

        tracing::info!(user_id = %account.id, "Login succeeded");

        Ok(AuthSession {
            access_token,
            account,
        })
    }

    async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let now = self.clock.now();
        let user_id = self
            .action_tokens
            .consume(token, ActionPurpose::VerifyEmail, now)
            .await?;

        self.accounts.mark_email_verified(&user_id, now).await?;
        tracing::info!(user_id = %user_id, "Email verified");

        Ok(())
    }

    async fn resend_verification(&self, email: &EmailAddress) -> Result<(), AuthError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            tracing::debug!("Verification resend requested for unknown email");
            return Ok(());
        };

        if account.email_verified {
            return Ok(());
        }

        self.issue_and_send(&account, ActionPurpose::VerifyEmail)
            .await
    }

    async fn forgot_password(&self, email: &EmailAddress) -> Result<(), AuthError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        self.issue_and_send(&account, ActionPurpose::ResetPassword)
            .await
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AuthError> {
        let now = self.clock.now();
        let user_id = self
            .action_tokens
            .consume(&command.token, ActionPurpose::ResetPassword, now)
            .await?;

        let password_hash = self
            .authenticator
            .hash_password(command.new_password.expose())?;

        self.accounts
            .update_password_hash(&user_id, &password_hash, now)
            .await?;
        tracing::info!(user_id = %user_id, "Password reset");

        Ok(())
    }

    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<Account>, AuthError> {
        self.accounts.find_by_id(id).await
    }
}
