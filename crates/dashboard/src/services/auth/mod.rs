//! Authentication service.
//!
//! Verifies an email/password pair against the stored Argon2 hash.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use tracing::{debug, error, instrument};

use invoicedesk_core::Email;

use crate::db::UserStore;
use crate::models::User;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash verified against when the email is unknown, so that branch costs the
/// same Argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("invoicedesk-unknown-user").ok());

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Verify an email and password.
    ///
    /// Input that cannot possibly be a valid login (bad email shape, short
    /// password) is rejected before the store is consulted. An unknown email
    /// and a wrong password produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the input is malformed, the
    /// user does not exist or the password does not match.
    /// Returns `AuthError::Repository` if the user lookup fails.
    #[instrument(skip(self, email, password))]
    pub async fn verify(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = match Email::parse(email.trim()) {
            Ok(email) => email,
            Err(e) => {
                debug!(reason = %e, "Rejected login with malformed email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        validate_password_shape(password)?;

        let stored = self.users.find_by_email(&email).await.map_err(|e| {
            error!(error = %e, "User lookup failed during login");
            AuthError::Repository(e)
        })?;

        let Some(stored) = stored else {
            debug!("Login for unknown email");
            if let Some(hash) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, hash);
            }
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, stored.password_hash.expose_secret())?;

        Ok(stored.user)
    }
}

/// Reject passwords too short to have been accepted at creation.
fn validate_password_shape(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        debug!("Rejected login with short password");
        return Err(AuthError::InvalidCredentials);
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// Parameters are read from the PHC string, so hashes made with other cost
/// settings still verify. A hash that cannot be parsed counts as a mismatch.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "Stored password hash is malformed");
        AuthError::InvalidCredentials
    })?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use argon2::{Algorithm, Params, Version};

    use super::*;
    use crate::db::memory::MemoryStore;

    pub const PASSWORD: &str = "123456";

    /// Hash with minimal cost so tests stay fast. Verification reads the
    /// parameters back out of the PHC string.
    pub fn cheap_hash(password: &str) -> String {
        let params = Params::new(1024, 1, 1, None).unwrap();
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        argon2
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    fn store_with_user() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_user("User", "user@nextmail.com", &cheap_hash(PASSWORD));
        store
    }

    #[tokio::test]
    async fn test_verify_success() {
        let store = store_with_user();
        let user = AuthService::new(&store)
            .verify("user@nextmail.com", PASSWORD)
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "user@nextmail.com");
        assert_eq!(user.name, "User");
    }

    #[tokio::test]
    async fn test_short_password_skips_lookup() {
        let store = store_with_user();
        let result = AuthService::new(&store).verify("user@x.com", "short").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(store.user_lookups(), 0);
    }

    #[tokio::test]
    async fn test_malformed_email_skips_lookup() {
        let store = store_with_user();
        let result = AuthService::new(&store).verify("not-an-email", PASSWORD).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(store.user_lookups(), 0);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let store = store_with_user();
        let service = AuthService::new(&store);

        let unknown = service.verify("nobody@nextmail.com", PASSWORD).await.unwrap_err();
        let wrong = service.verify("user@nextmail.com", "wrong-password").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.user_message(), wrong.user_message());
        assert_eq!(store.user_lookups(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_distinct() {
        let store = store_with_user();
        store.fail_all(true);
        let err = AuthService::new(&store)
            .verify("user@nextmail.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Repository(_)));
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }

    #[tokio::test]
    async fn test_malformed_stored_hash_is_mismatch() {
        let store = MemoryStore::new();
        store.add_user("User", "user@nextmail.com", "not-a-phc-string");
        let err = AuthService::new(&store)
            .verify("user@nextmail.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_dummy_hash_costs_the_same_as_a_real_one() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        let parsed = PasswordHash::new(hash).unwrap();

        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert_eq!(parsed.params.get_decimal("m"), Some(Params::DEFAULT_M_COST));
        assert_eq!(parsed.params.get_decimal("t"), Some(Params::DEFAULT_T_COST));
        assert!(verify_password(PASSWORD, hash).is_err());
    }

    #[test]
    fn test_hash_password_round_trips() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(verify_password("wrong horse", &hash).is_err());
    }
}
