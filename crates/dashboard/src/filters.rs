//! Custom Askama template filters.

use std::fmt::Display;

use chrono::NaiveDate;
use invoicedesk_core::Amount;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an amount in cents as currency.
///
/// Usage in templates: `{{ invoice.amount.cents()|currency }}` renders `$1,234.56`.
/// Input that is not an integer is rendered unchanged.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn currency(cents: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_currency(&cents.to_string()))
}

/// Formats an ISO date (`2022-12-06`) for display (`Dec 6, 2022`).
///
/// Usage in templates: `{{ invoice.date|format_date }}`
/// Input that is not an ISO date is rendered unchanged.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn format_date(date: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_iso_date(&date.to_string()))
}

fn format_currency(raw: &str) -> String {
    raw.trim()
        .parse::<i64>()
        .map_or_else(|_| raw.to_string(), |cents| Amount::from_cents(cents).to_string())
}

fn format_iso_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_or_else(|_| raw.to_string(), |d| d.format("%b %-d, %Y").to_string())
}
