//! Integration tests for the session gate and login.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database (invoicedesk migrate && invoicedesk seed)
//! - The dashboard running (cargo run -p invoicedesk-dashboard)

use invoicedesk_integration_tests::{
    DEMO_EMAIL, authenticated_client, base_url, client, location,
};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running dashboard"]
async fn test_health_endpoints() {
    let client = client().expect("Failed to create HTTP client");

    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach dashboard");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to reach dashboard");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running dashboard"]
async fn test_anonymous_dashboard_redirects_to_login() {
    let client = client().expect("Failed to create HTTP client");

    let resp = client
        .get(format!("{}/dashboard/invoices", base_url()))
        .send()
        .await
        .expect("Failed to reach dashboard");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        Some("/login?callbackUrl=%2Fdashboard%2Finvoices")
    );
}

#[tokio::test]
#[ignore = "Requires running dashboard"]
async fn test_wrong_password_is_rejected() {
    let client = client().expect("Failed to create HTTP client");

    let resp = client
        .post(format!("{}/login", base_url()))
        .form(&[("email", DEMO_EMAIL), ("password", "not-the-password")])
        .send()
        .await
        .expect("Failed to reach dashboard");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Invalid credentials."));
}

#[tokio::test]
#[ignore = "Requires running dashboard"]
async fn test_login_and_logout() {
    let client = authenticated_client()
        .await
        .expect("Failed to sign in");

    let resp = client
        .get(format!("{}/login", base_url()))
        .send()
        .await
        .expect("Failed to reach dashboard");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/dashboard"));

    let resp = client
        .get(format!("{}/dashboard", base_url()))
        .send()
        .await
        .expect("Failed to reach dashboard");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{}/dashboard/logout", base_url()))
        .send()
        .await
        .expect("Failed to reach dashboard");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .get(format!("{}/dashboard", base_url()))
        .send()
        .await
        .expect("Failed to reach dashboard");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}
