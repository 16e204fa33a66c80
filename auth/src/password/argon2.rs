use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::Error as PasswordHashError;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// Password hashing implementation.
///
/// Provides cryptographic password hashing (internally uses Argon2id).
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Upper bound on plaintext size accepted for hashing or verification.
    pub const MAX_INPUT_BYTES: usize = 1024;

    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password securely.
    ///
    /// Uses Argon2id with random salt generation, so hashing the same
    /// plaintext twice yields two different PHC strings.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `InvalidInput` - Password is empty or longer than `MAX_INPUT_BYTES`
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Self::check_input(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The digest comparison is performed by the argon2 crate in constant time.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `MalformedHash` - Stored hash is not a supported PHC string
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        // Never hashed, so never a match
        if password.len() > Self::MAX_INPUT_BYTES {
            return Ok(false);
        }

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }

    fn check_input(password: &str) -> Result<(), PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        if password.len() > Self::MAX_INPUT_BYTES {
            return Err(PasswordError::InvalidInput(format!(
                "password exceeds {} bytes",
                Self::MAX_INPUT_BYTES
            )));
        }
        Ok(())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "my_secure_password";

        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hasher
            .verify(password, &hash)
            .expect("Failed to verify password"));

        assert!(!hasher
            .verify("wrong_password", &hash)
            .expect("Failed to verify password"));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = PasswordHasher::new();

        let first = hasher.hash("Secret1!").unwrap();
        let second = hasher.hash("Secret1!").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(hasher.verify("Secret1!", &second).unwrap());
    }

    #[test]
    fn test_hash_rejects_empty_input() {
        let hasher = PasswordHasher::new();
        assert!(matches!(
            hasher.hash(""),
            Err(PasswordError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_hash_rejects_oversized_input() {
        let hasher = PasswordHasher::new();
        let password = "a".repeat(PasswordHasher::MAX_INPUT_BYTES + 1);
        assert!(matches!(
            hasher.hash(&password),
            Err(PasswordError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_verify_oversized_input_is_mismatch() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("Secret1!").unwrap();
        let password = "a".repeat(PasswordHasher::MAX_INPUT_BYTES + 1);
        assert_eq!(hasher.verify(&password, &hash), Ok(false));
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = PasswordHasher::new();
        let result = hasher.verify("password", "invalid_hash");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }
}
