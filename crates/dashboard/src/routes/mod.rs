//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Landing page
//! GET  /health                         - Health check
//! GET  /health/ready                   - Readiness check (database)
//!
//! # Auth
//! GET  /login                          - Login page (?callbackUrl=)
//! POST /login                          - Login action
//! POST /dashboard/logout               - Logout action
//!
//! # Dashboard (requires session)
//! GET  /dashboard                      - Overview cards and latest invoices
//! GET  /dashboard/customers            - Customers table (?query=)
//! GET  /dashboard/invoices             - Invoice listing (?query=&page=)
//! POST /dashboard/invoices             - Create invoice
//! GET  /dashboard/invoices/create      - Create form
//! GET  /dashboard/invoices/{id}/edit   - Edit form
//! POST /dashboard/invoices/{id}        - Update invoice
//! POST /dashboard/invoices/{id}/delete - Delete invoice
//! ```
//!
//! The session gate in [`crate::middleware::gate`] runs in front of all of
//! these, so handlers under `/dashboard` can assume a signed-in user.

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod home;
pub mod invoices;


use axum::{
    Router,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Create the dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/logout", post(auth::logout))
        .route("/customers", get(customers::index))
        .route("/invoices", get(invoices::index).post(invoices::create))
        .route("/invoices/create", get(invoices::create_page))
        .route("/invoices/{id}", post(invoices::update))
        .route("/invoices/{id}/edit", get(invoices::edit_page))
        .route("/invoices/{id}/delete", post(invoices::delete))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .nest("/dashboard", dashboard_routes())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}
