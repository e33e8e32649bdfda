//! Invoice amounts stored in minor currency units.
//!
//! Forms submit amounts in major units (`"45.00"` dollars). Storage and
//! arithmetic use whole cents so that totals never pick up floating-point
//! drift. Conversion goes through [`rust_decimal::Decimal`].

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Minor units per major unit (cents per dollar).
const MINOR_PER_MAJOR: i64 = 100;

/// Errors that can occur when converting a major-unit value into an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    /// The value is zero, negative, or rounds to less than one cent.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The value does not fit in the minor-unit range.
    #[error("amount is too large")]
    TooLarge,
}

/// An amount in cents.
///
/// ```
/// use invoicedesk_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::from_major(Decimal::new(4500, 2)).unwrap();
/// assert_eq!(amount.cents(), 4500);
/// assert_eq!(amount.to_string(), "$45.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// The zero amount, used as the identity for totals.
    pub const ZERO: Self = Self(0);

    /// Wrap a value that is already in cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a major-unit value into cents.
    ///
    /// The value is multiplied by 100 and rounded half away from zero, so
    /// `12.345` becomes `1235` cents.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::NotPositive`] if the value is not strictly
    /// positive or rounds to zero cents, and [`AmountError::TooLarge`] if the
    /// result overflows `i64`.
    pub fn from_major(major: Decimal) -> Result<Self, AmountError> {
        if major <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }

        let cents = major
            .checked_mul(Decimal::from(MINOR_PER_MAJOR))
            .ok_or(AmountError::TooLarge)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(AmountError::TooLarge)?;

        if cents <= 0 {
            return Err(AmountError::NotPositive);
        }

        Ok(Self(cents))
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The amount in major units with two decimal places (`4500` -> `45.00`).
    #[must_use]
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Add two amounts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }
}

impl fmt::Display for Amount {
    /// Formats as US currency with thousands separators (`$1,234.56`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = (abs / 100).to_string();
        let fraction = abs % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        write!(f, "{sign}${grouped}.{fraction:02}")
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Amount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Amount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let cents = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(cents))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Amount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn major(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_from_major_whole_and_fractional() {
        assert_eq!(Amount::from_major(major("45")).unwrap().cents(), 4500);
        assert_eq!(Amount::from_major(major("45.00")).unwrap().cents(), 4500);
        assert_eq!(Amount::from_major(major("0.01")).unwrap().cents(), 1);
        assert_eq!(Amount::from_major(major("157.95")).unwrap().cents(), 15795);
    }

    #[test]
    fn test_from_major_rounds_half_away_from_zero() {
        assert_eq!(Amount::from_major(major("12.345")).unwrap().cents(), 1235);
        assert_eq!(Amount::from_major(major("12.344")).unwrap().cents(), 1234);
        assert_eq!(Amount::from_major(major("0.005")).unwrap().cents(), 1);
    }

    #[test]
    fn test_from_major_rejects_non_positive() {
        assert_eq!(
            Amount::from_major(Decimal::ZERO),
            Err(AmountError::NotPositive)
        );
        assert_eq!(
            Amount::from_major(major("-3.50")),
            Err(AmountError::NotPositive)
        );
        assert_eq!(
            Amount::from_major(major("0.004")),
            Err(AmountError::NotPositive)
        );
    }

    #[test]
    fn test_from_major_rejects_overflow() {
        assert_eq!(
            Amount::from_major(Decimal::MAX),
            Err(AmountError::TooLarge)
        );
        assert_eq!(
            Amount::from_major(major("100000000000000000000")),
            Err(AmountError::TooLarge)
        );
    }

    #[test]
    fn test_to_major() {
        assert_eq!(Amount::from_cents(4500).to_major().to_string(), "45.00");
        assert_eq!(Amount::from_cents(7).to_major().to_string(), "0.07");
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Amount::from_cents(0).to_string(), "$0.00");
        assert_eq!(Amount::from_cents(4500).to_string(), "$45.00");
        assert_eq!(Amount::from_cents(123_456).to_string(), "$1,234.56");
        assert_eq!(Amount::from_cents(100_000_000).to_string(), "$1,000,000.00");
        assert_eq!(Amount::from_cents(-2550).to_string(), "-$25.50");
    }

    #[test]
    fn test_checked_add() {
        let total = Amount::from_cents(150).checked_add(Amount::from_cents(250));
        assert_eq!(total, Some(Amount::from_cents(400)));
        assert_eq!(Amount::from_cents(i64::MAX).checked_add(Amount::from_cents(1)), None);
    }
}
