//! Vendor payouts and buyer loyalty points.
//!
//! Once an order is delivered its vendor share is held for a confirmation
//! window, then released by an admin. A vendor's share is the total of their
//! own lines minus the platform commission.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::order::OrderItem;
use crate::types::{Money, MoneyError, PayoutStatus, UserId};

/// FCFA spent per loyalty point earned.
pub const FRANCS_PER_LOYALTY_POINT: u32 = 1_000;

/// Commission and hold settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutPolicy {
    /// Platform commission as a ratio in `[0, 1]`.
    pub commission_rate: Decimal,
    /// Time after delivery before funds may be released.
    pub window: TimeDelta,
}

impl Default for PayoutPolicy {
    fn default() -> Self {
        Self {
            commission_rate: Decimal::new(10, 2),
            window: TimeDelta::days(3),
        }
    }
}

/// Why a payout could not be released.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PayoutError {
    /// Payout is not in the `held` state.
    #[error("payout is {0}, not held")]
    NotHeld(PayoutStatus),
    /// The order has no delivery timestamp.
    #[error("order has not been delivered")]
    NotDelivered,
    /// The confirmation window is still running.
    #[error("payout can be released from {release_at}")]
    WindowOpen { release_at: DateTime<Utc> },
    /// Amount arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One vendor's share of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VendorShare {
    pub seller_id: UserId,
    /// Sum of the vendor's lines.
    pub gross: Money,
    /// Platform commission withheld.
    pub commission: Money,
    /// Amount paid to the vendor.
    pub net: Money,
}

impl PayoutPolicy {
    /// Compute `seller`'s share of an order.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on overflow.
    pub fn vendor_share(&self, items: &[OrderItem], seller: UserId) -> Result<VendorShare, MoneyError> {
        let gross = items
            .iter()
            .filter(|item| item.seller_id == seller)
            .try_fold(Money::ZERO, |acc, item| acc.checked_add(item.line_total()?))?;
        let commission = gross.portion(self.commission_rate);

        Ok(VendorShare {
            seller_id: seller,
            gross,
            commission,
            net: gross.saturating_sub(commission),
        })
    }

    /// Earliest release time for an order delivered at `delivered_at`.
    ///
    /// A window reaching past the representable range never opens.
    #[must_use]
    pub fn release_at(&self, delivered_at: DateTime<Utc>) -> DateTime<Utc> {
        delivered_at
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Check that a payout may be released at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::NotHeld`], [`PayoutError::NotDelivered`], or
    /// [`PayoutError::WindowOpen`].
    pub fn check_release(
        &self,
        status: PayoutStatus,
        delivered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), PayoutError> {
        if status != PayoutStatus::Held {
            return Err(PayoutError::NotHeld(status));
        }
        let delivered_at = delivered_at.ok_or(PayoutError::NotDelivered)?;
        let release_at = self.release_at(delivered_at);
        if now < release_at {
            return Err(PayoutError::WindowOpen { release_at });
        }
        Ok(())
    }
}

/// Loyalty points earned for an order total: one per full 1 000 FCFA.
#[must_use]
pub fn loyalty_points(total: Money) -> i32 {
    (total.amount() / Decimal::from(FRANCS_PER_LOYALTY_POINT))
        .trunc()
        .to_i32()
        .unwrap_or(i32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::ProductId;

    fn item(seller: i32, price: u32, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(1),
            seller_id: UserId::new(seller),
            name: "Sac en raphia".to_string(),
            unit_price: Money::francs(price),
            quantity,
            size: None,
            color: None,
        }
    }

    #[test]
    fn test_vendor_share_only_counts_own_lines() {
        let items = vec![item(1, 10_000, 2), item(2, 5_000, 1), item(1, 1_000, 1)];
        let share = PayoutPolicy::default()
            .vendor_share(&items, UserId::new(1))
            .unwrap();

        assert_eq!(share.gross, Money::francs(21_000));
        assert_eq!(share.commission, Money::francs(2_100));
        assert_eq!(share.net, Money::francs(18_900));
    }

    #[test]
    fn test_vendor_share_for_absent_seller_is_zero() {
        let share = PayoutPolicy::default()
            .vendor_share(&[item(1, 10_000, 1)], UserId::new(9))
            .unwrap();
        assert_eq!(share.net, Money::ZERO);
    }

    #[test]
    fn test_release_respects_window() {
        let policy = PayoutPolicy::default();
        let delivered = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let early = delivered + TimeDelta::days(2);
        assert!(matches!(
            policy.check_release(PayoutStatus::Held, Some(delivered), early),
            Err(PayoutError::WindowOpen { .. })
        ));

        let exact = delivered + TimeDelta::days(3);
        assert_eq!(
            policy.check_release(PayoutStatus::Held, Some(delivered), exact),
            Ok(())
        );
    }

    #[test]
    fn test_huge_window_never_opens() {
        let policy = PayoutPolicy {
            window: TimeDelta::MAX,
            ..PayoutPolicy::default()
        };
        let delivered = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        assert_eq!(policy.release_at(delivered), DateTime::<Utc>::MAX_UTC);
        assert!(matches!(
            policy.check_release(PayoutStatus::Held, Some(delivered), Utc::now()),
            Err(PayoutError::WindowOpen { .. })
        ));
    }

    #[test]
    fn test_release_requires_held() {
        let policy = PayoutPolicy::default();
        let now = Utc::now();
        assert_eq!(
            policy.check_release(PayoutStatus::NotDue, Some(now), now),
            Err(PayoutError::NotHeld(PayoutStatus::NotDue))
        );
        assert_eq!(
            policy.check_release(PayoutStatus::Released, Some(now), now),
            Err(PayoutError::NotHeld(PayoutStatus::Released))
        );
        assert_eq!(
            PayoutError::NotHeld(PayoutStatus::Released).to_string(),
            "payout is released, not held"
        );
        assert_eq!(
            policy.check_release(PayoutStatus::Held, None, now),
            Err(PayoutError::NotDelivered)
        );
    }

    #[test]
    fn test_loyalty_points() {
        assert_eq!(loyalty_points(Money::francs(999)), 0);
        assert_eq!(loyalty_points(Money::francs(1_000)), 1);
        assert_eq!(loyalty_points(Money::francs(25_750)), 25);
    }
}
