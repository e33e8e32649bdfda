//! User domain types.

use secrecy::SecretString;

use invoicedesk_core::{Email, UserId};

/// A dashboard user, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: Email,
}

/// A user together with their stored password hash.
///
/// Only the credential verifier sees this type. The hash is a PHC string
/// (`$argon2id$...`) and is kept behind `SecretString` so it never lands in
/// logs through `Debug`.
#[derive(Debug, Clone)]
pub struct StoredUser {
    /// The user record.
    pub user: User,
    /// Argon2 PHC hash of the password.
    pub password_hash: SecretString,
}
