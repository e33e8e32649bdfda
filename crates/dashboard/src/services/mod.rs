//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `auth` - Email/password verification against Argon2 hashes
//! - `invoices` - Invoice mutations, form validation and listing reads
//!
//! Services borrow their stores as trait objects for the duration of a
//! request and are constructed from [`crate::state::AppState`] in handlers.

pub mod auth;
pub mod invoices;
