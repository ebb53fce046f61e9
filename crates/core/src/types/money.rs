//! Amounts in Central African CFA francs (FCFA / XAF).
//!
//! The marketplace trades in a single currency, so [`Money`] carries no currency
//! code. FCFA has no minor unit in everyday use; amounts keep at most two decimal
//! places so that commission arithmetic stays exact.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// Amount has more than two decimal places.
    #[error("amount cannot have more than {max} decimal places")]
    TooPrecise {
        /// Maximum number of decimal places.
        max: u32,
    },
    /// Arithmetic overflowed.
    #[error("amount overflow")]
    Overflow,
}

/// A non-negative FCFA amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Maximum number of decimal places kept.
    pub const MAX_SCALE: u32 = 2;

    /// Zero FCFA.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, rejecting negative or over-precise values.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] or [`MoneyError::TooPrecise`].
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        let normalized = amount.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(MoneyError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }
        Ok(Self(normalized))
    }

    /// Whole francs, for literals and tests.
    #[must_use]
    pub fn francs(amount: u32) -> Self {
        Self(Decimal::from(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// `self * quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product does not fit.
    pub fn times(self, quantity: u32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// `self + other`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the sum does not fit.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// `self - other`, floored at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Multiply by a ratio in `[0, 1]` and round half-up to two decimals.
    #[must_use]
    pub fn portion(self, ratio: Decimal) -> Self {
        let ratio = ratio.clamp(Decimal::ZERO, Decimal::ONE);
        let value = (self.0 * ratio)
            .round_dp_with_strategy(Self::MAX_SCALE, RoundingStrategy::MidpointAwayFromZero);
        Self(value.normalize())
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

/// French formatting with space-grouped thousands: `12 500 FCFA`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0.trunc().abs().to_string();
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }

        let frac = self.0.fract();
        if frac.is_zero() {
            write!(f, "{grouped} FCFA")
        } else {
            let cents = (frac.abs() * Decimal::ONE_HUNDRED)
                .round()
                .to_u8()
                .unwrap_or_default();
            write!(f, "{grouped},{cents:02} FCFA")
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative_and_over_precise() {
        assert_eq!(Money::new(Decimal::new(-1, 0)), Err(MoneyError::Negative));
        assert!(matches!(
            Money::new(Decimal::new(1005, 3)),
            Err(MoneyError::TooPrecise { max: 2 })
        ));
        assert!(Money::new(Decimal::new(1250, 2)).is_ok());
        // Trailing zeros do not count as precision.
        assert!(Money::new(Decimal::new(15_000, 3)).is_ok());
    }

    #[test]
    fn test_times_and_add() {
        let unit = Money::francs(2_500);
        assert_eq!(unit.times(3).unwrap(), Money::francs(7_500));
        assert_eq!(
            unit.checked_add(Money::francs(500)).unwrap(),
            Money::francs(3_000)
        );
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        assert_eq!(Money::francs(100).saturating_sub(Money::francs(300)), Money::ZERO);
        assert_eq!(
            Money::francs(300).saturating_sub(Money::francs(100)),
            Money::francs(200)
        );
    }

    #[test]
    fn test_portion_rounds_half_up() {
        // 10% commission on 1 005 FCFA is 100.5 FCFA.
        let fee = Money::francs(1_005).portion(Decimal::new(10, 2));
        assert_eq!(fee.amount(), Decimal::new(1005, 1));
        let odd = Money::new(Decimal::new(333, 2)).unwrap().portion(Decimal::new(5, 1));
        assert_eq!(odd.amount(), Decimal::new(167, 2));
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::francs(0).to_string(), "0 FCFA");
        assert_eq!(Money::francs(950).to_string(), "950 FCFA");
        assert_eq!(Money::francs(12_500).to_string(), "12 500 FCFA");
        assert_eq!(Money::francs(1_250_000).to_string(), "1 250 000 FCFA");
        assert_eq!(
            Money::new(Decimal::new(100_050, 2)).unwrap().to_string(),
            "1 000,50 FCFA"
        );
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let parsed: Result<Money, _> = serde_json::from_str("\"-5\"");
        assert!(parsed.is_err());
        let parsed: Money = serde_json::from_str("\"7500\"").unwrap();
        assert_eq!(parsed, Money::francs(7_500));
    }
}
