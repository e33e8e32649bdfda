//! Customer repository (read-only).

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::{CustomerStore, RepositoryError, contains_pattern};
use crate::models::{CustomerField, CustomerSummary};

/// `PostgreSQL`-backed [`CustomerStore`].
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for CustomerRepository {
    #[instrument(skip(self))]
    async fn fields(&self) -> Result<Vec<CustomerField>, RepositoryError> {
        let customers = sqlx::query_as::<_, CustomerField>(
            "SELECT id, name FROM customers ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    #[instrument(skip(self))]
    async fn summaries(&self, query: &str) -> Result<Vec<CustomerSummary>, RepositoryError> {
        let customers = sqlx::query_as::<_, CustomerSummary>(
            r"
            SELECT
                customers.id,
                customers.name,
                customers.email,
                customers.image_url,
                COUNT(invoices.id) AS total_invoices,
                COALESCE(SUM(CASE WHEN invoices.status = 'pending' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_pending,
                COALESCE(SUM(CASE WHEN invoices.status = 'paid' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_paid
            FROM customers
            LEFT JOIN invoices ON customers.id = invoices.customer_id
            WHERE
                customers.name ILIKE $1 ESCAPE '\' OR
                customers.email ILIKE $1 ESCAPE '\'
            GROUP BY customers.id, customers.name, customers.email, customers.image_url
            ORDER BY customers.name ASC
            ",
        )
        .bind(contains_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}
