use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::account::errors::AuthError;
use crate::domain::account::errors::EmailSendError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountStatus;
use crate::domain::account::models::AuthSession;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::models::RegisterCommand;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::models::Role;
use crate::domain::account::models::UserId;
use crate::domain::action_token::models::ActionTokenSecret;

/// Port for the authentication workflow.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new, unverified account and send it a verification token.
    ///
    /// # Arguments
    /// * `command` - Validated names, username, email and password
    ///
    /// # Returns
    /// Created account (no access token is issued before verification)
    ///
    /// # Errors
    /// * `EmailTaken` - Email is already registered
    /// * `UsernameTaken` - Username is already taken
    /// * `Storage` - Database operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Account, AuthError>;

    /// Authenticate with email and password.
    ///
    /// # Returns
    /// Access token and the authenticated account
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `AccountDisabled` - Password matched but the account is disabled
    /// * `EmailNotVerified` - Password matched but verification is required and missing
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError>;

    /// Redeem an email verification token.
    ///
    /// # Errors
    /// * `ActionToken` - Token not found, expired or already used
    /// * `NotFound` - Token owner no longer exists
    async fn verify_email(&self, token: &str) -> Result<(), AuthError>;

    /// Re-send a verification token; succeeds without effect for unknown or
    /// already verified addresses.
    async fn resend_verification(&self, email: &EmailAddress) -> Result<(), AuthError>;

    /// Send a password reset token; succeeds without effect for unknown addresses.
    async fn forgot_password(&self, email: &EmailAddress) -> Result<(), AuthError>;

    /// Redeem a reset token and replace the account's password.
    ///
    /// # Errors
    /// * `ActionToken` - Token not found, expired or already used
    /// * `NotFound` - Token owner no longer exists
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AuthError>;

    /// Look up an account; `None` when absent.
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<Account>, AuthError>;
}

/// Port for administrative account changes.
#[async_trait]
pub trait UserManagementPort: Send + Sync + 'static {
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_role(&self, id: &UserId, role: Role) -> Result<Account, AuthError>;

    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_status(&self, id: &UserId, status: AccountStatus)
        -> Result<Account, AuthError>;
}

/// Persistence operations for the account aggregate.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account.
    ///
    /// # Errors
    /// * `EmailTaken` - Email unique constraint violated
    /// * `UsernameTaken` - Username unique constraint violated
    /// * `Storage` - Database operation failed
    async fn create(&self, account: Account) -> Result<Account, AuthError>;

    /// # Returns
    /// Optional account (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, AuthError>;

    /// # Returns
    /// Optional account (None if not found)
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AuthError>;

    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// # Errors
    /// * `NotFound` - User does not exist
    async fn mark_email_verified(
        &self,
        id: &UserId,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_role(
        &self,
        id: &UserId,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, AuthError>;

    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_status(
        &self,
        id: &UserId,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, AuthError>;
}

/// Outbound delivery of action tokens.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// # Errors
    /// * `InvalidAddress` / `Message` - Message could not be built
    /// * `Transport` - Delivery failed
    async fn send_verification_email(
        &self,
        to: &EmailAddress,
        token: &ActionTokenSecret,
    ) -> Result<(), EmailSendError>;

    async fn send_password_reset_email(
        &self,
        to: &EmailAddress,
        token: &ActionTokenSecret,
    ) -> Result<(), EmailSendError>;
}
