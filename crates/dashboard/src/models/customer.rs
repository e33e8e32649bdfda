//! Customer read models.
//!
//! Customers are managed outside the dashboard; these are read-only views.

use invoicedesk_core::{Amount, CustomerId, Email};

/// A full customer record.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
    pub image_url: String,
}

/// Customer option for the invoice form's select box.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CustomerField {
    pub id: CustomerId,
    pub name: String,
}

/// A customer with invoice totals, for the customers table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: Amount,
    pub total_paid: Amount,
}
