//! Database operations for the dashboard `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Dashboard logins (Argon2 password hashes)
//! - `customers` - Billed parties, read-only from the dashboard
//! - `invoices` - Amounts in cents, `pending`/`paid` status, issue date
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/dashboard/migrations/` and run via:
//! ```bash
//! cargo run -p invoicedesk-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Handlers and services never touch the pool directly. They go through the
//! [`InvoiceStore`], [`CustomerStore`] and [`UserStore`] traits, implemented
//! here by the `*Repository` types over a [`PgPool`].

pub mod customers;
pub mod invoices;
#[cfg(test)]
pub mod memory;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use invoicedesk_core::{Email, InvoiceId};

use crate::models::{
    CardData, CustomerField, CustomerSummary, Invoice, InvoiceInput, InvoiceRow, LatestInvoice,
    NewInvoice, StoredUser,
};

pub use customers::CustomerRepository;
pub use invoices::InvoiceRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unknown customer, duplicate email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store Traits
// =============================================================================

/// Invoice persistence.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Insert a new invoice and return its generated id.
    async fn insert(&self, invoice: &NewInvoice) -> Result<InvoiceId, RepositoryError>;

    /// Overwrite customer, amount and status. Returns the number of rows
    /// affected, which is 0 when no invoice has this id.
    async fn update(&self, id: InvoiceId, input: &InvoiceInput) -> Result<u64, RepositoryError>;

    /// Delete an invoice. Returns the number of rows removed (0 or 1).
    async fn delete(&self, id: InvoiceId) -> Result<u64, RepositoryError>;

    /// Fetch one invoice.
    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError>;

    /// One page of invoices matching `query`, newest first.
    async fn filtered(&self, query: &str, page: u32) -> Result<Vec<InvoiceRow>, RepositoryError>;

    /// Number of invoices matching `query`.
    async fn count_filtered(&self, query: &str) -> Result<i64, RepositoryError>;

    /// The `limit` most recent invoices.
    async fn latest(&self, limit: u32) -> Result<Vec<LatestInvoice>, RepositoryError>;

    /// Headline counts and totals.
    async fn card_data(&self) -> Result<CardData, RepositoryError>;
}

/// Customer reads.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// All customers as select options, ordered by name.
    async fn fields(&self) -> Result<Vec<CustomerField>, RepositoryError>;

    /// Customers matching `query` with their invoice totals, ordered by name.
    async fn summaries(&self, query: &str) -> Result<Vec<CustomerSummary>, RepositoryError>;
}

/// User lookup for credential verification.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the user with exactly this email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<StoredUser>, RepositoryError>;
}

/// `ILIKE` pattern matching `query` anywhere in a column.
///
/// Wildcards in `query` match literally; queries pair this with
/// `ESCAPE '\'`.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::from("%");
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_wraps_trimmed_query() {
        assert_eq!(contains_pattern("  Lee "), "%Lee%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("_"), r"%\_%");
        assert_eq!(contains_pattern("100%"), r"%100\%%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
