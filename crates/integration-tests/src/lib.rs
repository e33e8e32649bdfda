//! Integration tests for Invoicedesk.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and start the dashboard
//! invoicedesk migrate && invoicedesk seed
//! cargo run -p invoicedesk-dashboard
//!
//! # Run integration tests
//! cargo test -p invoicedesk-integration-tests -- --ignored
//! ```
//!
//! The tests assume the demo data from `invoicedesk seed`.

use reqwest::{Client, StatusCode, redirect};

/// Demo login created by `invoicedesk seed`.
pub const DEMO_EMAIL: &str = "user@nextmail.com";
/// Password of the demo login.
pub const DEMO_PASSWORD: &str = "123456";
/// Seeded customer "Lee Robinson".
pub const DEMO_CUSTOMER_ID: &str = "3958dc9e-742f-4377-85e9-fec4b6a6442a";

/// Base URL for the dashboard (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("DASHBOARD_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on `303` responses.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub fn client() -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
}

/// A client that has signed in as the demo user.
///
/// # Errors
///
/// Returns an error if the request fails or login is rejected.
pub async fn authenticated_client() -> Result<Client, Box<dyn std::error::Error>> {
    let client = client()?;
    let resp = client
        .post(format!("{}/login", base_url()))
        .form(&[("email", DEMO_EMAIL), ("password", DEMO_PASSWORD)])
        .send()
        .await?;

    if resp.status() != StatusCode::SEE_OTHER {
        return Err(format!("login failed with status {}", resp.status()).into());
    }
    Ok(client)
}

/// Value of the `Location` header, if any.
#[must_use]
pub fn location(resp: &reqwest::Response) -> Option<&str> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Invoice ids linked from a listing page, in page order.
#[must_use]
pub fn invoice_ids(listing_html: &str) -> Vec<uuid::Uuid> {
    const PREFIX: &str = "/dashboard/invoices/";
    listing_html
        .match_indices(PREFIX)
        .filter_map(|(at, _)| {
            let rest = listing_html.get(at + PREFIX.len()..)?;
            let (id, tail) = rest.split_once('/')?;
            tail.starts_with("edit").then(|| uuid::Uuid::parse_str(id).ok())?
        })
        .collect()
}
