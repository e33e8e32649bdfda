//! CLI subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use invoicedesk_dashboard::db::{self, RepositoryError};
use invoicedesk_dashboard::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Built-in seed data is malformed.
    #[error("Invalid seed data: {0}")]
    SeedData(String),

    /// Password too short or not hashable.
    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

impl From<AuthError> for CommandError {
    fn from(e: AuthError) -> Self {
        Self::InvalidPassword(e.to_string())
    }
}

/// Database URL from `DASHBOARD_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    std::env::var("DASHBOARD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DASHBOARD_DATABASE_URL"))
}

/// Load `.env` and connect to the dashboard database.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();
    let url = database_url()?;

    tracing::info!("Connecting to dashboard database...");
    Ok(db::create_pool(&url).await?)
}
