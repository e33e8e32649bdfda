//! In-memory stores for tests.
//!
//! One [`MemoryStore`] implements all three store traits so a test can seed
//! customers, users and invoices in one place and then inspect what the code
//! under test wrote.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;

use invoicedesk_core::{Amount, CustomerId, Email, InvoiceId, InvoiceStatus, UserId};

use super::{CustomerStore, InvoiceStore, RepositoryError, UserStore};
use crate::models::invoice::{ITEMS_PER_PAGE, page_offset};
use crate::models::{
    CardData, Customer, CustomerField, CustomerSummary, Invoice, InvoiceInput, InvoiceRow,
    LatestInvoice, NewInvoice, StoredUser, User,
};

#[derive(Default)]
pub struct MemoryStore {
    customers: Mutex<Vec<Customer>>,
    invoices: Mutex<Vec<Invoice>>,
    users: Mutex<Vec<StoredUser>>,
    user_lookups: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error.
    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn add_customer(&self, name: &str, email: &str) -> CustomerId {
        let id = CustomerId::new(uuid::Uuid::new_v4());
        self.customers.lock().unwrap().push(Customer {
            id,
            name: name.to_string(),
            email: Email::parse(email).unwrap(),
            image_url: format!("/static/customers/{}.png", name.to_lowercase().replace(' ', "-")),
        });
        id
    }

    pub fn add_invoice(
        &self,
        customer_id: CustomerId,
        cents: i64,
        status: InvoiceStatus,
        date: NaiveDate,
    ) -> InvoiceId {
        let id = InvoiceId::new(uuid::Uuid::new_v4());
        self.invoices.lock().unwrap().push(Invoice {
            id,
            customer_id,
            amount: Amount::from_cents(cents),
            status,
            date,
        });
        id
    }

    pub fn add_user(&self, name: &str, email: &str, password_hash: &str) -> UserId {
        let id = UserId::new(uuid::Uuid::new_v4());
        self.users.lock().unwrap().push(StoredUser {
            user: User {
                id,
                name: name.to_string(),
                email: Email::parse(email).unwrap(),
            },
            password_hash: SecretString::from(password_hash),
        });
        id
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.invoices.lock().unwrap().clone()
    }

    pub fn invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.invoices().into_iter().find(|i| i.id == id)
    }

    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Joined rows, newest first, matching the `ILIKE` filter semantics.
    fn joined_rows(&self, query: &str) -> Vec<InvoiceRow> {
        let needle = query.trim().to_lowercase();
        let mut rows: Vec<InvoiceRow> = self
            .invoices()
            .into_iter()
            .filter_map(|invoice| {
                let customer = self.customer(invoice.customer_id)?;
                Some(InvoiceRow {
                    id: invoice.id,
                    amount: invoice.amount,
                    date: invoice.date,
                    status: invoice.status,
                    name: customer.name,
                    email: customer.email,
                    image_url: customer.image_url,
                })
            })
            .filter(|row| {
                [
                    row.name.to_lowercase(),
                    row.email.as_str().to_lowercase(),
                    row.amount.cents().to_string(),
                    row.date.to_string(),
                    row.status.as_str().to_string(),
                ]
                .iter()
                .any(|field| field.contains(&needle))
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check()
    }

    async fn insert(&self, invoice: &NewInvoice) -> Result<InvoiceId, RepositoryError> {
        self.check()?;
        if self.customer(invoice.customer_id).is_none() {
            return Err(RepositoryError::Conflict("customer does not exist".to_string()));
        }
        Ok(self.add_invoice(
            invoice.customer_id,
            invoice.amount.cents(),
            invoice.status,
            invoice.date,
        ))
    }

    async fn update(&self, id: InvoiceId, input: &InvoiceInput) -> Result<u64, RepositoryError> {
        self.check()?;
        if self.customer(input.customer_id).is_none() {
            return Err(RepositoryError::Conflict("customer does not exist".to_string()));
        }
        let mut invoices = self.invoices.lock().unwrap();
        let Some(invoice) = invoices.iter_mut().find(|i| i.id == id) else {
            return Ok(0);
        };
        invoice.customer_id = input.customer_id;
        invoice.amount = input.amount;
        invoice.status = input.status;
        Ok(1)
    }

    async fn delete(&self, id: InvoiceId) -> Result<u64, RepositoryError> {
        self.check()?;
        let mut invoices = self.invoices.lock().unwrap();
        let before = invoices.len();
        invoices.retain(|i| i.id != id);
        Ok((before - invoices.len()) as u64)
    }

    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        self.check()?;
        Ok(self.invoice(id))
    }

    async fn filtered(&self, query: &str, page: u32) -> Result<Vec<InvoiceRow>, RepositoryError> {
        self.check()?;
        Ok(self
            .joined_rows(query)
            .into_iter()
            .skip(page_offset(page) as usize)
            .take(ITEMS_PER_PAGE as usize)
            .collect())
    }

    async fn count_filtered(&self, query: &str) -> Result<i64, RepositoryError> {
        self.check()?;
        Ok(self.joined_rows(query).len() as i64)
    }

    async fn latest(&self, limit: u32) -> Result<Vec<LatestInvoice>, RepositoryError> {
        self.check()?;
        Ok(self
            .joined_rows("")
            .into_iter()
            .take(limit as usize)
            .map(|row| LatestInvoice {
                id: row.id,
                amount: row.amount,
                name: row.name,
                email: row.email,
                image_url: row.image_url,
            })
            .collect())
    }

    async fn card_data(&self) -> Result<CardData, RepositoryError> {
        self.check()?;
        let invoices = self.invoices();
        let total = |status: InvoiceStatus| {
            Amount::from_cents(
                invoices
                    .iter()
                    .filter(|i| i.status == status)
                    .map(|i| i.amount.cents())
                    .sum(),
            )
        };
        Ok(CardData {
            number_of_invoices: invoices.len() as i64,
            number_of_customers: self.customers.lock().unwrap().len() as i64,
            total_paid: total(InvoiceStatus::Paid),
            total_pending: total(InvoiceStatus::Pending),
        })
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn fields(&self) -> Result<Vec<CustomerField>, RepositoryError> {
        self.check()?;
        let mut fields: Vec<CustomerField> = self
            .customers
            .lock()
            .unwrap()
            .iter()
            .map(|c| CustomerField {
                id: c.id,
                name: c.name.clone(),
            })
            .collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fields)
    }

    async fn summaries(&self, query: &str) -> Result<Vec<CustomerSummary>, RepositoryError> {
        self.check()?;
        let needle = query.trim().to_lowercase();
        let invoices = self.invoices();
        let customers = self.customers.lock().unwrap().clone();
        let mut summaries: Vec<CustomerSummary> = customers
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.email.as_str().to_lowercase().contains(&needle)
            })
            .map(|c| {
                let owned: Vec<&Invoice> =
                    invoices.iter().filter(|i| i.customer_id == c.id).collect();
                let total = |status: InvoiceStatus| {
                    Amount::from_cents(
                        owned
                            .iter()
                            .filter(|i| i.status == status)
                            .map(|i| i.amount.cents())
                            .sum(),
                    )
                };
                CustomerSummary {
                    total_invoices: owned.len() as i64,
                    total_pending: total(InvoiceStatus::Pending),
                    total_paid: total(InvoiceStatus::Paid),
                    id: c.id,
                    name: c.name,
                    email: c.email,
                    image_url: c.image_url,
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<StoredUser>, RepositoryError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| &u.user.email == email)
            .cloned())
    }
}
