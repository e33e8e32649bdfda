//! Customers table route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, CustomerSummary};
use crate::state::AppState;

/// Query parameters for the customers table.
#[derive(Debug, Default, Deserialize)]
pub struct CustomersQuery {
    #[serde(default)]
    pub query: String,
}

/// Customers table template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/customers.html")]
pub struct CustomersTemplate {
    pub user: CurrentUser,
    pub query: String,
    pub customers: Vec<CustomerSummary>,
}

/// Display customers matching the search box, with invoice totals.
///
/// # Errors
///
/// Returns `AppError::Database` if the read fails.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<CustomersQuery>,
) -> Result<CustomersTemplate> {
    let customers = state
        .invoice_service()
        .fetch_filtered_customers(&params.query)
        .await?;

    Ok(CustomersTemplate {
        user,
        query: params.query,
        customers,
    })
}
