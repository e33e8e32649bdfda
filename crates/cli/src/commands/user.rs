//! Dashboard user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Password from the environment
//! INVOICEDESK_USER_PASSWORD=... invoicedesk user create -e user@example.com -n "User Name"
//!
//! # Password on the command line
//! invoicedesk user create -e user@example.com -n "User Name" --password ...
//! ```

use secrecy::SecretString;

use invoicedesk_core::{Email, UserId};
use invoicedesk_dashboard::db::UserRepository;
use invoicedesk_dashboard::services::auth::{MIN_PASSWORD_LENGTH, hash_password};

use super::{CommandError, connect};

/// Check a password is long enough to ever pass login.
fn check_password(password: &str) -> Result<(), CommandError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CommandError::InvalidPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Create a new dashboard user.
///
/// # Errors
///
/// Returns an error if the email or password is invalid, the user already
/// exists, or the database is unreachable.
pub async fn create(email: &str, name: &str, password: &str) -> Result<UserId, CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::InvalidEmail(e.to_string()))?;
    check_password(password)?;
    let hash = SecretString::from(hash_password(password)?);

    let pool = connect().await?;
    let user = UserRepository::new(pool).create(name, &email, &hash).await?;

    tracing::info!("User created successfully! ID: {}, Email: {}", user.id, user.email);
    Ok(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_password_length() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
    }
}
