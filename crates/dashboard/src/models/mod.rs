//! Domain models for the dashboard.
//!
//! Row types returned by the stores and the identity kept in the session.

pub mod customer;
pub mod invoice;
pub mod session;
pub mod user;

pub use customer::{Customer, CustomerField, CustomerSummary};
pub use invoice::{
    CardData, Invoice, InvoiceInput, InvoicePage, InvoiceRow, LatestInvoice, NewInvoice,
};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{StoredUser, User};
