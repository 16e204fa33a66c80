//! Authentication utilities library
//!
//! Provides the credential primitives of the authentication service:
//! - Password hashing (Argon2id)
//! - Access token issuance and validation (HS256 JWT)
//! - Authentication coordination
//!
//! Issuance and validation take the current instant as an argument so callers
//! can inject their own clock.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::{TokenIssuer, TokenSettings};
//! use chrono::{Duration, Utc};
//!
//! let issuer = TokenIssuer::new(TokenSettings {
//!     secret: b"secret_key_at_least_32_bytes_long!".to_vec(),
//!     ttl: Duration::minutes(30),
//!     issuer: None,
//!     audience: None,
//!     leeway: Duration::seconds(5),
//! })
//! .unwrap();
//!
//! let now = Utc::now();
//! let access = issuer.issue("user123", vec!["USER_ROLE".to_string()], now).unwrap();
//! let claims = issuer.validate(&access.token, now).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::AccessToken;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenIssuer;
pub use jwt::TokenSettings;
pub use password::PasswordError;
pub use password::PasswordHasher;
