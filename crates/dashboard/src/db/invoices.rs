//! Invoice repository.
//!
//! Amounts are stored as `BIGINT` cents and status as text, so every column
//! maps straight onto the core types. Sums are cast back to `BIGINT` because
//! `SUM(bigint)` yields `NUMERIC` in `PostgreSQL`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use invoicedesk_core::{Amount, InvoiceId};

use super::{InvoiceStore, RepositoryError, contains_pattern};
use crate::models::invoice::{ITEMS_PER_PAGE, page_offset};
use crate::models::{CardData, Invoice, InvoiceInput, InvoiceRow, LatestInvoice, NewInvoice};

/// `PostgreSQL`-backed [`InvoiceStore`].
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    /// Create a new invoice repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a foreign-key failure on `customer_id` to a conflict.
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict("customer does not exist".to_string());
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, invoice), fields(customer_id = %invoice.customer_id))]
    async fn insert(&self, invoice: &NewInvoice) -> Result<InvoiceId, RepositoryError> {
        let (id,): (InvoiceId,) = sqlx::query_as(
            r"
            INSERT INTO invoices (customer_id, amount, status, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(invoice.customer_id)
        .bind(invoice.amount)
        .bind(invoice.status)
        .bind(invoice.date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!(invoice_id = %id, "Inserted invoice");
        Ok(id)
    }

    #[instrument(skip(self, input), fields(invoice_id = %id))]
    async fn update(&self, id: InvoiceId, input: &InvoiceInput) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE invoices
            SET customer_id = $1, amount = $2, status = $3
            WHERE id = $4
            ",
        )
        .bind(input.customer_id)
        .bind(input.amount)
        .bind(input.status)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn delete(&self, id: InvoiceId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r"
            SELECT id, customer_id, amount, status, date
            FROM invoices
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn filtered(&self, query: &str, page: u32) -> Result<Vec<InvoiceRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            r"
            SELECT
                invoices.id,
                invoices.amount,
                invoices.date,
                invoices.status,
                customers.name,
                customers.email,
                customers.image_url
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            WHERE
                customers.name ILIKE $1 ESCAPE '\' OR
                customers.email ILIKE $1 ESCAPE '\' OR
                invoices.amount::text ILIKE $1 ESCAPE '\' OR
                invoices.date::text ILIKE $1 ESCAPE '\' OR
                invoices.status ILIKE $1 ESCAPE '\'
            ORDER BY invoices.date DESC, invoices.id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(contains_pattern(query))
        .bind(i64::from(ITEMS_PER_PAGE))
        .bind(i64::from(page_offset(page)))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn count_filtered(&self, query: &str) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*)
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            WHERE
                customers.name ILIKE $1 ESCAPE '\' OR
                customers.email ILIKE $1 ESCAPE '\' OR
                invoices.amount::text ILIKE $1 ESCAPE '\' OR
                invoices.date::text ILIKE $1 ESCAPE '\' OR
                invoices.status ILIKE $1 ESCAPE '\'
            ",
        )
        .bind(contains_pattern(query))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn latest(&self, limit: u32) -> Result<Vec<LatestInvoice>, RepositoryError> {
        let rows = sqlx::query_as::<_, LatestInvoice>(
            r"
            SELECT invoices.id, invoices.amount, customers.name, customers.email, customers.image_url
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            ORDER BY invoices.date DESC, invoices.id
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn card_data(&self) -> Result<CardData, RepositoryError> {
        let (number_of_invoices, total_paid, total_pending): (i64, i64, i64) = sqlx::query_as(
            r"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'paid' THEN amount ELSE 0 END), 0)::BIGINT,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN amount ELSE 0 END), 0)::BIGINT
            FROM invoices
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        let (number_of_customers,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(CardData {
            number_of_invoices,
            number_of_customers,
            total_paid: Amount::from_cents(total_paid),
            total_pending: Amount::from_cents(total_pending),
        })
    }
}
