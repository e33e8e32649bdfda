//! Invoice service: mutations and the reads behind the dashboard pages.
//!
//! Mutations return a [`MutationOutcome`] rather than an error: an invalid
//! form and a failed write are both ordinary results that the handler renders
//! back into the form. On success the listing cache for
//! [`INVOICES_PATH`] is invalidated before the redirect is returned.

pub mod validation;

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, instrument, warn};

use invoicedesk_core::InvoiceId;

use crate::cache::{ListingCache, ListingKey};
use crate::db::{CustomerStore, InvoiceStore, RepositoryError};
use crate::models::invoice::page_count;
use crate::models::{CardData, CustomerField, CustomerSummary, Invoice, InvoicePage, LatestInvoice};

pub use validation::{Field, FormAction, FormErrors, InvoiceForm, validate};

/// The invoice listing page; mutations redirect here and invalidate it.
pub const INVOICES_PATH: &str = "/dashboard/invoices";

/// Number of invoices shown on the dashboard overview.
pub const LATEST_INVOICES: u32 = 5;

/// State handed back to a form after a rejected submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub errors: std::collections::BTreeMap<Field, Vec<String>>,
    pub message: Option<String>,
}

impl FormState {
    /// Messages recorded for `field`.
    #[must_use]
    pub fn field_errors(&self, field: Field) -> &[String] {
        self.errors.get(&field).map_or(&[], Vec::as_slice)
    }

    fn failed(message: String) -> Self {
        Self {
            errors: std::collections::BTreeMap::new(),
            message: Some(message),
        }
    }
}

impl From<FormErrors> for FormState {
    fn from(errors: FormErrors) -> Self {
        Self {
            errors: errors.errors,
            message: Some(errors.message),
        }
    }
}

/// Result of a create, update or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The write succeeded; send the browser here.
    Redirect(&'static str),
    /// The form failed validation. Nothing was written.
    Invalid(FormState),
    /// The write failed. The cause has been logged.
    Failed(FormState),
}

/// Invoice service.
pub struct InvoiceService<'a> {
    invoices: &'a dyn InvoiceStore,
    customers: &'a dyn CustomerStore,
    cache: &'a ListingCache,
    today: NaiveDate,
}

impl<'a> InvoiceService<'a> {
    /// Create a new invoice service. New invoices are dated today (UTC).
    #[must_use]
    pub fn new(
        invoices: &'a dyn InvoiceStore,
        customers: &'a dyn CustomerStore,
        cache: &'a ListingCache,
    ) -> Self {
        Self {
            invoices,
            customers,
            cache,
            today: chrono::Utc::now().date_naive(),
        }
    }

    /// Override the issue date given to new invoices.
    #[must_use]
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Validate and insert a new invoice dated today.
    #[instrument(skip(self, form))]
    pub async fn create(&self, form: &InvoiceForm) -> MutationOutcome {
        let input = match validate(form, FormAction::Create) {
            Ok(input) => input,
            Err(errors) => return MutationOutcome::Invalid(errors.into()),
        };

        match self.invoices.insert(&input.issued_on(self.today)).await {
            Ok(id) => {
                info!(invoice_id = %id, amount = input.amount.cents(), "Invoice created");
                self.finish().await
            }
            Err(e) => {
                error!(error = %e, "Failed to create invoice");
                MutationOutcome::Failed(FormState::failed(
                    FormAction::Create.database_error_message(),
                ))
            }
        }
    }

    /// Validate and overwrite an invoice's customer, amount and status.
    ///
    /// The issue date is never changed. Updating an id that does not exist
    /// writes nothing and still counts as success.
    #[instrument(skip(self, form), fields(invoice_id = %id))]
    pub async fn update(&self, id: InvoiceId, form: &InvoiceForm) -> MutationOutcome {
        let input = match validate(form, FormAction::Update) {
            Ok(input) => input,
            Err(errors) => return MutationOutcome::Invalid(errors.into()),
        };

        match self.invoices.update(id, &input).await {
            Ok(0) => {
                warn!("Update matched no invoice");
                self.finish().await
            }
            Ok(_) => {
                info!("Invoice updated");
                self.finish().await
            }
            Err(e) => {
                error!(error = %e, "Failed to update invoice");
                MutationOutcome::Failed(FormState::failed(
                    FormAction::Update.database_error_message(),
                ))
            }
        }
    }

    /// Delete an invoice. Deleting an id that does not exist is a no-op.
    #[instrument(skip(self), fields(invoice_id = %id))]
    pub async fn delete(&self, id: InvoiceId) -> MutationOutcome {
        match self.invoices.delete(id).await {
            Ok(rows) => {
                info!(rows, "Invoice deleted");
                self.finish().await
            }
            Err(e) => {
                error!(error = %e, "Failed to delete invoice");
                MutationOutcome::Failed(FormState::failed(
                    "Database Error. Failed to Delete Invoice.".to_string(),
                ))
            }
        }
    }

    /// Invalidate the listing, then redirect to it.
    async fn finish(&self) -> MutationOutcome {
        self.cache.invalidate_path(INVOICES_PATH).await;
        MutationOutcome::Redirect(INVOICES_PATH)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch one invoice for the edit form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn fetch_invoice_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        self.invoices.find_by_id(id).await
    }

    /// All customers for the form's select box, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn fetch_customers(&self) -> Result<Vec<CustomerField>, RepositoryError> {
        self.customers.fields().await
    }

    /// One page of the filtered listing, served through the listing cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the page is not cached and the store fails.
    pub async fn fetch_filtered_invoices(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Arc<InvoicePage>, RepositoryError> {
        let page = page.max(1);
        self.cache
            .get_or_load(ListingKey::new(INVOICES_PATH, query, page), || async move {
                let rows = self.invoices.filtered(query, page).await?;
                let total_pages = self.fetch_invoices_pages(query).await?;
                Ok::<_, RepositoryError>(InvoicePage { rows, total_pages })
            })
            .await
    }

    /// Number of listing pages for `query`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the count fails.
    pub async fn fetch_invoices_pages(&self, query: &str) -> Result<u32, RepositoryError> {
        Ok(page_count(self.invoices.count_filtered(query).await?))
    }

    /// Headline numbers for the overview.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn fetch_card_data(&self) -> Result<CardData, RepositoryError> {
        self.invoices.card_data().await
    }

    /// The most recent invoices for the overview.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn fetch_latest_invoices(&self) -> Result<Vec<LatestInvoice>, RepositoryError> {
        self.invoices.latest(LATEST_INVOICES).await
    }

    /// Customers matching `query` with invoice totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn fetch_filtered_customers(
        &self,
        query: &str,
    ) -> Result<Vec<CustomerSummary>, RepositoryError> {
        self.customers.summaries(query).await
    }
}
