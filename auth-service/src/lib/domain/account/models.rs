use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::account::errors::AttributeError;
use crate::domain::account::errors::EmailError;
use crate::domain::account::errors::PasswordPolicyError;
use crate::domain::account::errors::PersonNameError;
use crate::domain::account::errors::UserIdError;
use crate::domain::account::errors::UsernameError;

/// Account aggregate entity.
///
/// A locally authenticated user. The password hash is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    pub name: PersonName,
    pub surname: PersonName,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Role names embedded in access tokens issued for this account.
    pub fn role_names(&self) -> Vec<String> {
        vec![self.role.as_str().to_string()]
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters and contains only alphanumeric, underscore, and hyphen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    /// * `InvalidCharacters` - Contains non-alphanumeric characters (except _ and -)
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.chars().count();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validated with an RFC 5322 parser and normalized (trimmed, lower-cased) so
/// that equality and storage uniqueness are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name component (first name or surname).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    const MAX_LENGTH: usize = 100;

    /// # Errors
    /// * `Blank` - Empty after trimming
    /// * `TooLong` - Longer than 100 characters
    pub fn new(name: String) -> Result<Self, PersonNameError> {
        let trimmed = name.trim();
        let length = trimmed.chars().count();
        if length == 0 {
            Err(PersonNameError::Blank)
        } else if length > Self::MAX_LENGTH {
            Err(PersonNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password that satisfies the registration policy.
///
/// Only ever hashed; `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 128;

    /// # Errors
    /// * `TooShort` / `TooLong` - Outside 8..=128 characters
    /// * `MissingCharacterClass` - No letter or no digit
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        let has_letter = password.chars().any(char::is_alphabetic);
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_letter && has_digit) {
            return Err(PasswordPolicyError::MissingCharacterClass);
        }
        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Role assigned to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub const USER: &'static str = "USER_ROLE";
    pub const ADMIN: &'static str = "ADMIN_ROLE";

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => Self::USER,
            Role::Admin => Self::ADMIN,
        }
    }
}

impl FromStr for Role {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::USER => Ok(Role::User),
            Self::ADMIN => Ok(Role::Admin),
            other => Err(AttributeError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    Active,
    Disabled,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Disabled => "disabled",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "disabled" => Ok(AccountStatus::Disabled),
            other => Err(AttributeError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command to register a new account with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub name: PersonName,
    pub surname: PersonName,
    pub username: Username,
    pub email: EmailAddress,
    pub password: Password,
}

/// Login credentials.
///
/// The password is deliberately not policy-checked: a failing policy check
/// would reveal more than "invalid credentials".
#[derive(Debug)]
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: String,
}

/// Command to finish a password reset
#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub token: String,
    pub new_password: Password,
}

/// Successful login: a signed access token plus the account it was issued for.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: auth::AccessToken,
    pub account: Account,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(Username::new("alice_01".to_string()).is_ok());
        assert_eq!(
            Username::new("al".to_string()),
            Err(UsernameError::TooShort { min: 3, actual: 2 })
        );
        assert_eq!(
            Username::new("a".repeat(33)),
            Err(UsernameError::TooLong {
                max: 32,
                actual: 33
            })
        );
        assert_eq!(
            Username::new("alice smith".to_string()),
            Err(UsernameError::InvalidCharacters)
        );
    }

    #[test]
    fn test_email_is_normalized() {
        let email = EmailAddress::new("  A@X.com ".to_string()).unwrap();
        assert_eq!(email.as_str(), "a@x.com");
        assert_eq!(email, EmailAddress::new("a@x.COM".to_string()).unwrap());
    }

    #[test]
    fn test_email_rejects_garbage() {
        assert!(matches!(
            EmailAddress::new("not-an-email".to_string()),
            Err(EmailError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_password_policy() {
        assert!(Password::new("Secret1!".to_string()).is_ok());
        assert_eq!(
            Password::new("Sh0rt".to_string()),
            Err(PasswordPolicyError::TooShort { min: 8, actual: 5 })
        );
        assert_eq!(
            Password::new("onlyletters".to_string()),
            Err(PasswordPolicyError::MissingCharacterClass)
        );
        assert!(matches!(
            Password::new(format!("a1{}", "x".repeat(127))),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("Secret1!".to_string()).unwrap();
        assert!(!format!("{:?}", password).contains("Secret1!"));
    }

    #[test]
    fn test_person_name() {
        assert_eq!(PersonName::new("  Ada ".to_string()).unwrap().as_str(), "Ada");
        assert_eq!(
            PersonName::new("   ".to_string()),
            Err(PersonNameError::Blank)
        );
    }

    #[test]
    fn test_role_and_status_round_trip_names() {
        assert_eq!("ADMIN_ROLE".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::User.as_str(), "USER_ROLE");
        assert!(matches!(
            "ROOT".parse::<Role>(),
            Err(AttributeError::UnknownRole(_))
        ));
        assert_eq!("disabled".parse::<AccountStatus>(), Ok(AccountStatus::Disabled));
    }
}
