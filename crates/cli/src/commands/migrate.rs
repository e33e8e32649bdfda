//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! invoicedesk migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DASHBOARD_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/dashboard/migrations/` and are embedded at
//! compile time:
//!
//! ```text
//! migrations/
//! ├── 20241001000001_create_users.sql
//! ├── 20241001000002_create_customers.sql
//! ├── 20241001000003_create_invoices.sql
//! └── 20241001000004_create_sessions.sql
//! ```

use super::{CommandError, connect};

/// Run dashboard database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running dashboard migrations...");
    sqlx::migrate!("../dashboard/migrations").run(&pool).await?;

    tracing::info!("Dashboard migrations complete!");
    Ok(())
}
