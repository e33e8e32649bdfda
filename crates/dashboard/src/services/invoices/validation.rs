//! Invoice form validation.
//!
//! Turns the raw text of a submitted invoice form into an [`InvoiceInput`],
//! or into per-field error messages for re-rendering the form. Every field is
//! checked; errors are collected rather than stopping at the first one.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use invoicedesk_core::{Amount, AmountError, CustomerId, InvoiceStatus};

use crate::models::InvoiceInput;

pub const CUSTOMER_MESSAGE: &str = "Please select a customer.";
pub const AMOUNT_MESSAGE: &str = "Please enter an amount greater than $0.";
pub const AMOUNT_TOO_LARGE_MESSAGE: &str = "Amount is too large.";
pub const STATUS_MESSAGE: &str = "Please select an invoice status.";

/// Raw invoice form as submitted. Missing fields deserialize as empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvoiceForm {
    #[serde(rename = "customerId", default)]
    pub customer_id: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub status: String,
}

/// Which mutation the form is for. Only affects the summary message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Create,
    Update,
}

impl FormAction {
    const fn verb(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
        }
    }

    /// Summary shown when one or more fields are invalid.
    #[must_use]
    pub fn missing_fields_message(self) -> String {
        format!("Missing Fields. Failed to {} Invoice.", self.verb())
    }

    /// Summary shown when the write itself fails.
    #[must_use]
    pub fn database_error_message(self) -> String {
        format!("Database Error. Failed to {} Invoice.", self.verb())
    }
}

/// Form field an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CustomerId,
    Amount,
    Status,
}

impl Field {
    /// The form field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomerId => "customerId",
            Self::Amount => "amount",
            Self::Status => "status",
        }
    }
}

/// Per-field validation errors plus a summary message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormErrors {
    pub errors: BTreeMap<Field, Vec<String>>,
    pub message: String,
}

impl FormErrors {
    /// Messages recorded for `field`, empty if it was valid.
    #[must_use]
    pub fn for_field(&self, field: Field) -> &[String] {
        self.errors.get(&field).map_or(&[], Vec::as_slice)
    }
}

/// Validate a submitted invoice form.
///
/// # Errors
///
/// Returns `FormErrors` listing every invalid field if any field fails.
pub fn validate(form: &InvoiceForm, action: FormAction) -> Result<InvoiceInput, FormErrors> {
    let mut errors: BTreeMap<Field, Vec<String>> = BTreeMap::new();

    let customer_id = parse_customer_id(&form.customer_id)
        .map_err(|msg| errors.entry(Field::CustomerId).or_default().push(msg.to_string()))
        .ok();
    let amount = parse_amount(&form.amount)
        .map_err(|msg| errors.entry(Field::Amount).or_default().push(msg.to_string()))
        .ok();
    let status = parse_status(&form.status)
        .map_err(|msg| errors.entry(Field::Status).or_default().push(msg.to_string()))
        .ok();

    match (customer_id, amount, status) {
        (Some(customer_id), Some(amount), Some(status)) => Ok(InvoiceInput {
            customer_id,
            amount,
            status,
        }),
        _ => Err(FormErrors {
            errors,
            message: action.missing_fields_message(),
        }),
    }
}

fn parse_customer_id(raw: &str) -> Result<CustomerId, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CUSTOMER_MESSAGE);
    }
    CustomerId::parse(raw).map_err(|_| CUSTOMER_MESSAGE)
}

/// Coerce amount text into cents.
///
/// Blank text counts as zero and so fails the positivity check. Plain
/// decimals and scientific notation (`1e3`) are accepted.
fn parse_amount(raw: &str) -> Result<Amount, &'static str> {
    let raw = raw.trim();
    let major = if raw.is_empty() {
        Decimal::ZERO
    } else {
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .map_err(|_| AMOUNT_MESSAGE)?
    };

    Amount::from_major(major).map_err(|e| match e {
        AmountError::NotPositive => AMOUNT_MESSAGE,
        AmountError::TooLarge => AMOUNT_TOO_LARGE_MESSAGE,
    })
}

fn parse_status(raw: &str) -> Result<InvoiceStatus, &'static str> {
    raw.parse().map_err(|_| STATUS_MESSAGE)
}
