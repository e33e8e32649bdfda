//! Seed the dashboard database with demo data.
//!
//! Inserts one login user, a handful of customers and their invoices. Safe to
//! run more than once: existing users and customers are kept, and invoices are
//! only added to an empty table.
//!
//! # Usage
//!
//! ```bash
//! invoicedesk seed
//! ```

use chrono::NaiveDate;
use secrecy::SecretString;
use sqlx::PgPool;
use tracing::{info, warn};

use invoicedesk_core::{Amount, CustomerId, Email, InvoiceStatus};
use invoicedesk_dashboard::db::{InvoiceStore, InvoiceRepository, RepositoryError, UserRepository};
use invoicedesk_dashboard::models::NewInvoice;
use invoicedesk_dashboard::services::auth::hash_password;

use super::{CommandError, connect};

/// Demo login.
const DEMO_USER: (&str, &str, &str) = ("User", "user@nextmail.com", "123456");

/// `(id, name, email, image_url)`
const CUSTOMERS: &[(&str, &str, &str, &str)] = &[
    ("d6e15727-9fe1-4961-8c5b-ea44a9bd81aa", "Evil Rabbit", "evil@rabbit.com", "/static/customers/evil-rabbit.png"),
    ("3958dc9e-712f-4377-85e9-fec4b6a6442a", "Delba de Oliveira", "delba@oliveira.com", "/static/customers/delba-de-oliveira.png"),
    ("3958dc9e-742f-4377-85e9-fec4b6a6442a", "Lee Robinson", "lee@robinson.com", "/static/customers/lee-robinson.png"),
    ("76d65c26-f784-44a2-ac19-586678f7c2f2", "Michael Novotny", "michael@novotny.com", "/static/customers/michael-novotny.png"),
    ("cc27c14a-0acf-4f4a-a6c9-d45682c144b9", "Amy Burns", "amy@burns.com", "/static/customers/amy-burns.png"),
    ("13d07535-c59e-4157-a011-f8d2ef4e0cbb", "Balazs Orban", "balazs@orban.com", "/static/customers/balazs-orban.png"),
];

/// `(customer index, cents, status, date)`
const INVOICES: &[(usize, i64, &str, &str)] = &[
    (0, 15795, "pending", "2022-12-06"),
    (1, 20348, "pending", "2022-11-14"),
    (4, 3040, "paid", "2022-10-29"),
    (3, 44800, "paid", "2023-09-10"),
    (5, 34577, "pending", "2023-08-05"),
    (2, 54246, "pending", "2023-07-16"),
    (0, 666, "pending", "2023-06-27"),
    (3, 32545, "paid", "2023-06-09"),
    (4, 1250, "paid", "2023-06-17"),
    (5, 8546, "paid", "2023-06-07"),
    (1, 500, "paid", "2023-08-19"),
    (5, 8945, "paid", "2023-06-03"),
    (2, 1000, "paid", "2022-06-05"),
];

/// Seed the demo user, customers and invoices.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    seed_user(&pool).await?;
    let customers = seed_customers(&pool).await?;
    seed_invoices(&pool, &customers).await?;

    info!("Seeding complete!");
    Ok(())
}

async fn seed_user(pool: &PgPool) -> Result<(), CommandError> {
    let (name, email, password) = DEMO_USER;
    let email = Email::parse(email).map_err(|e| CommandError::InvalidEmail(e.to_string()))?;
    let hash = SecretString::from(hash_password(password)?);

    match UserRepository::new(pool.clone()).create(name, &email, &hash).await {
        Ok(user) => info!(user_id = %user.id, "Seeded user {email}"),
        Err(RepositoryError::Conflict(_)) => info!("User {email} already exists, skipping"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn seed_customers(pool: &PgPool) -> Result<Vec<CustomerId>, CommandError> {
    let mut ids = Vec::with_capacity(CUSTOMERS.len());

    for &(id, name, email, image_url) in CUSTOMERS {
        let id = CustomerId::parse(id)
            .map_err(|e| CommandError::SeedData(format!("customer id {id}: {e}")))?;
        sqlx::query(
            r"
            INSERT INTO customers (id, name, email, image_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(id.as_uuid())
        .bind(name)
        .bind(email)
        .bind(image_url)
        .execute(pool)
        .await?;
        ids.push(id);
    }

    info!(count = ids.len(), "Seeded customers");
    Ok(ids)
}

async fn seed_invoices(pool: &PgPool, customers: &[CustomerId]) -> Result<(), CommandError> {
    let invoices = InvoiceRepository::new(pool.clone());

    if invoices.count_filtered("").await? > 0 {
        info!("Invoices already present, skipping");
        return Ok(());
    }

    let mut inserted = 0_usize;
    for &(customer, cents, status, date) in INVOICES {
        let (Some(&customer_id), Ok(status), Ok(date)) = (
            customers.get(customer),
            status.parse::<InvoiceStatus>(),
            NaiveDate::parse_from_str(date, "%Y-%m-%d"),
        ) else {
            warn!(customer, status, date, "Skipping malformed seed invoice");
            continue;
        };

        invoices
            .insert(&NewInvoice {
                customer_id,
                amount: Amount::from_cents(cents),
                status,
                date,
            })
            .await?;
        inserted += 1;
    }

    info!(count = inserted, "Seeded invoices");
    Ok(())
}
