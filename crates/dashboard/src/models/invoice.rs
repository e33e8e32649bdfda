//! Invoice models.

use chrono::NaiveDate;

use invoicedesk_core::{Amount, CustomerId, Email, InvoiceId, InvoiceStatus};

/// Number of rows on one invoice listing page.
pub const ITEMS_PER_PAGE: u32 = 6;

/// An invoice as stored.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: Amount,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

/// The user-editable part of an invoice, after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceInput {
    pub customer_id: CustomerId,
    pub amount: Amount,
    pub status: InvoiceStatus,
}

impl InvoiceInput {
    /// Stamp the input with its issue date, producing an insertable invoice.
    #[must_use]
    pub const fn issued_on(self, date: NaiveDate) -> NewInvoice {
        NewInvoice {
            customer_id: self.customer_id,
            amount: self.amount,
            status: self.status,
            date,
        }
    }
}

/// A validated invoice ready to insert. The id is assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewInvoice {
    pub customer_id: CustomerId,
    pub amount: Amount,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

/// One row of the invoice listing, joined with its customer.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: InvoiceId,
    pub amount: Amount,
    pub date: NaiveDate,
    pub status: InvoiceStatus,
    pub name: String,
    pub email: Email,
    pub image_url: String,
}

/// A page of the filtered listing plus the page count for the same filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePage {
    pub rows: Vec<InvoiceRow>,
    pub total_pages: u32,
}

/// Recent invoice shown on the dashboard overview.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LatestInvoice {
    pub id: InvoiceId,
    pub amount: Amount,
    pub name: String,
    pub email: Email,
    pub image_url: String,
}

/// Headline numbers for the dashboard overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardData {
    pub number_of_invoices: i64,
    pub number_of_customers: i64,
    pub total_paid: Amount,
    pub total_pending: Amount,
}

/// Number of pages needed to show `count` rows.
#[must_use]
pub fn page_count(count: i64) -> u32 {
    let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
    count.div_ceil(ITEMS_PER_PAGE)
}

/// Row offset of a 1-based page number. Page 0 is treated as page 1.
#[must_use]
pub const fn page_offset(page: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(ITEMS_PER_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(6), 1);
        assert_eq!(page_count(7), 2);
        assert_eq!(page_count(13), 3);
        assert_eq!(page_count(-4), 0);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(0), 0);
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(2), 6);
        assert_eq!(page_offset(u32::MAX), u32::MAX);
    }
}
