//! Invoice route handlers.
//!
//! Listing, create and edit forms, and the three mutations. Mutations go
//! through [`InvoiceService`](crate::services::invoices::InvoiceService); a
//! rejected submission is rendered back into the form with its errors, a
//! successful one is answered with `303 See Other` to the listing.

use std::collections::BTreeSet;
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use invoicedesk_core::InvoiceId;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, CustomerField, Invoice, InvoicePage};
use crate::services::invoices::{Field, FormState, INVOICES_PATH, InvoiceForm, MutationOutcome};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the listing.
///
/// `page` is kept as text so a malformed value falls back to page 1 instead
/// of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub query: String,
    pub page: Option<String>,
}

impl ListingQuery {
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

// =============================================================================
// View Models
// =============================================================================

/// Pages within this distance of the current one get their own link.
const PAGE_WINDOW: u32 = 2;

/// A numbered link in the listing's pagination, or a gap between two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub is_current: bool,
    pub is_gap: bool,
}

impl PageLink {
    fn gap() -> Self {
        Self {
            number: 0,
            href: String::new(),
            is_current: false,
            is_gap: true,
        }
    }
}

/// Pagination controls for the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub links: Vec<PageLink>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Pagination {
    /// Links to the first and last pages and to the pages around `current`,
    /// with gaps where numbers are skipped.
    fn new(query: &str, current: u32, total: u32) -> Self {
        let mut visible = BTreeSet::new();
        if total > 0 {
            visible.insert(1);
            visible.insert(total);
            let low = current.saturating_sub(PAGE_WINDOW).max(1);
            let high = current.saturating_add(PAGE_WINDOW).min(total);
            visible.extend(low..=high);
        }

        let mut links = Vec::with_capacity(visible.len() + 2);
        let mut previous = 0;
        for number in visible {
            if number > previous + 1 {
                links.push(PageLink::gap());
            }
            links.push(PageLink {
                number,
                href: page_href(query, number),
                is_current: number == current,
                is_gap: false,
            });
            previous = number;
        }

        Self {
            links,
            prev: (current > 1).then(|| page_href(query, current - 1)),
            next: (current < total).then(|| page_href(query, current + 1)),
        }
    }
}

fn page_href(query: &str, page: u32) -> String {
    let query = query.trim();
    if query.is_empty() {
        format!("{INVOICES_PATH}?page={page}")
    } else {
        format!(
            "{INVOICES_PATH}?query={}&page={page}",
            urlencoding::encode(query)
        )
    }
}

/// An option in the customer select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Everything the invoice form needs to render, including errors from a
/// rejected submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFormView {
    pub customers: Vec<CustomerOption>,
    pub nothing_selected: bool,
    pub amount: String,
    pub pending_checked: bool,
    pub paid_checked: bool,
    pub customer_errors: Vec<String>,
    pub amount_errors: Vec<String>,
    pub status_errors: Vec<String>,
    pub message: Option<String>,
}

impl InvoiceFormView {
    fn new(customers: Vec<CustomerField>, form: &InvoiceForm, state: &FormState) -> Self {
        let selected = form.customer_id.trim();
        let customers: Vec<CustomerOption> = customers
            .into_iter()
            .map(|c| {
                let id = c.id.to_string();
                CustomerOption {
                    selected: id == selected,
                    id,
                    name: c.name,
                }
            })
            .collect();

        Self {
            nothing_selected: !customers.iter().any(|c| c.selected),
            customers,
            amount: form.amount.clone(),
            pending_checked: form.status == "pending",
            paid_checked: form.status == "paid",
            customer_errors: state.field_errors(Field::CustomerId).to_vec(),
            amount_errors: state.field_errors(Field::Amount).to_vec(),
            status_errors: state.field_errors(Field::Status).to_vec(),
            message: state.message.clone(),
        }
    }
}

/// Form contents matching a stored invoice, for the edit page.
fn form_for(invoice: &Invoice) -> InvoiceForm {
    InvoiceForm {
        customer_id: invoice.customer_id.to_string(),
        amount: invoice.amount.to_major().to_string(),
        status: invoice.status.as_str().to_string(),
    }
}

/// Which form is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Edit(InvoiceId),
}

impl FormTarget {
    const fn title(self) -> &'static str {
        match self {
            Self::Create => "Create Invoice",
            Self::Edit(_) => "Edit Invoice",
        }
    }

    const fn submit_label(self) -> &'static str {
        match self {
            Self::Create => "Create Invoice",
            Self::Edit(_) => "Edit Invoice",
        }
    }

    fn action(self) -> String {
        match self {
            Self::Create => INVOICES_PATH.to_string(),
            Self::Edit(id) => format!("{INVOICES_PATH}/{id}"),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Invoice listing template.
#[derive(Template, WebTemplate)]
#[template(path = "invoices/index.html")]
pub struct ListingTemplate {
    pub user: CurrentUser,
    pub query: String,
    pub page: Arc<InvoicePage>,
    pub pagination: Pagination,
    pub error: Option<String>,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "invoices/form.html")]
pub struct InvoiceFormTemplate {
    pub user: CurrentUser,
    pub title: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub form: InvoiceFormView,
}

impl InvoiceFormTemplate {
    fn new(user: CurrentUser, target: FormTarget, form: InvoiceFormView) -> Self {
        Self {
            user,
            title: target.title(),
            action: target.action(),
            submit_label: target.submit_label(),
            form,
        }
    }
}

// =============================================================================
// Listing
// =============================================================================

async fn listing(
    state: &AppState,
    user: CurrentUser,
    params: ListingQuery,
    error: Option<String>,
) -> Result<ListingTemplate> {
    let current = params.page();
    let page = state
        .invoice_service()
        .fetch_filtered_invoices(&params.query, current)
        .await?;
    let pagination = Pagination::new(&params.query, current, page.total_pages);

    Ok(ListingTemplate {
        user,
        query: params.query,
        page,
        pagination,
        error,
    })
}

/// Display one page of invoices matching the search box.
///
/// # Errors
///
/// Returns `AppError::Database` if the listing cannot be loaded.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<ListingQuery>,
) -> Result<ListingTemplate> {
    listing(&state, user, params, None).await
}

// =============================================================================
// Forms
// =============================================================================

/// Display the create form.
///
/// # Errors
///
/// Returns `AppError::Database` if customers cannot be loaded.
pub async fn create_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<InvoiceFormTemplate> {
    let customers = state.invoice_service().fetch_customers().await?;
    let form = InvoiceFormView::new(customers, &InvoiceForm::default(), &FormState::default());
    Ok(InvoiceFormTemplate::new(user, FormTarget::Create, form))
}

/// Display the edit form, prefilled from the stored invoice.
///
/// A malformed or unknown id is a 404.
///
/// # Errors
///
/// Returns `AppError::NotFound` if there is no such invoice, or
/// `AppError::Database` if a read fails.
#[instrument(skip(state, user))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(raw_id): Path<String>,
) -> Result<InvoiceFormTemplate> {
    let id = InvoiceId::parse(&raw_id).map_err(|_| AppError::NotFound("invoice".to_string()))?;

    let service = state.invoice_service();
    let (invoice, customers) =
        tokio::try_join!(service.fetch_invoice_by_id(id), service.fetch_customers())?;
    let invoice = invoice.ok_or_else(|| AppError::NotFound("invoice".to_string()))?;

    let form = InvoiceFormView::new(customers, &form_for(&invoice), &FormState::default());
    Ok(InvoiceFormTemplate::new(user, FormTarget::Edit(id), form))
}

// =============================================================================
// Mutations
// =============================================================================

/// Turn a create/update outcome into a response.
///
/// Invalid input re-renders with 422, a failed write with 500; the submitted
/// values are kept in both cases.
async fn form_response(
    state: &AppState,
    user: CurrentUser,
    target: FormTarget,
    form: &InvoiceForm,
    outcome: MutationOutcome,
) -> Result<Response> {
    let (status, form_state) = match outcome {
        MutationOutcome::Redirect(to) => {
            let message = match target {
                FormTarget::Create => "Created invoice",
                FormTarget::Edit(_) => "Updated invoice",
            };
            add_breadcrumb("invoices", message, None);
            return Ok(Redirect::to(to).into_response());
        }
        MutationOutcome::Invalid(form_state) => (StatusCode::UNPROCESSABLE_ENTITY, form_state),
        MutationOutcome::Failed(form_state) => (StatusCode::INTERNAL_SERVER_ERROR, form_state),
    };

    let customers = state.invoice_service().fetch_customers().await?;
    let view = InvoiceFormView::new(customers, form, &form_state);
    Ok((status, InvoiceFormTemplate::new(user, target, view)).into_response())
}

/// Handle create form submission.
///
/// # Errors
///
/// Returns `AppError::Database` if the form must be re-rendered and customers
/// cannot be loaded.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<InvoiceForm>,
) -> Result<Response> {
    let outcome = state.invoice_service().create(&form).await;
    form_response(&state, user, FormTarget::Create, &form, outcome).await
}

/// Handle edit form submission.
///
/// # Errors
///
/// Returns `AppError::Database` if the form must be re-rendered and customers
/// cannot be loaded.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<InvoiceId>,
    Form(form): Form<InvoiceForm>,
) -> Result<Response> {
    let outcome = state.invoice_service().update(id, &form).await;
    form_response(&state, user, FormTarget::Edit(id), &form, outcome).await
}

/// Handle delete.
///
/// A failed delete renders the first listing page with the error shown.
///
/// # Errors
///
/// Returns `AppError::Database` if the listing cannot be loaded after a
/// failed delete.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<InvoiceId>,
) -> Result<Response> {
    match state.invoice_service().delete(id).await {
        MutationOutcome::Redirect(to) => {
            let invoice_id = id.to_string();
            add_breadcrumb(
                "invoices",
                "Deleted invoice",
                Some(&[("invoice_id", invoice_id.as_str())]),
            );
            Ok(Redirect::to(to).into_response())
        }
        MutationOutcome::Invalid(form_state) | MutationOutcome::Failed(form_state) => {
            let page = listing(&state, user, ListingQuery::default(), form_state.message).await?;
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}
