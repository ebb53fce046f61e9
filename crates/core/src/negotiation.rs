//! Price offers made by buyers on listed products.
//!
//! A buyer proposes a price strictly below the listed price and at or above a
//! marketplace-wide floor. The seller then accepts or rejects it; there are no
//! counter-offers and offers never expire.

use serde::{Deserialize, Serialize};

use crate::types::{Money, NegotiationStatus, UserId};

/// Bounds applied to every offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferPolicy {
    /// Lowest acceptable proposed price.
    pub floor: Money,
}

impl Default for OfferPolicy {
    fn default() -> Self {
        Self {
            floor: Money::francs(500),
        }
    }
}

/// Why an offer or a response was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OfferError {
    /// Proposed price is below the marketplace floor.
    #[error("proposed price must be at least {floor}")]
    BelowFloor { floor: Money },
    /// Proposed price is not below the listed price.
    #[error("proposed price must be below the listed price of {listed}")]
    NotBelowListed { listed: Money },
    /// Sellers cannot negotiate on their own products.
    #[error("cannot make an offer on your own product")]
    OwnProduct,
    /// The buyer already has a pending offer on this product.
    #[error("an offer on this product is already pending")]
    AlreadyPending,
    /// Only pending offers can be answered.
    #[error("offer has already been {0}")]
    AlreadyAnswered(NegotiationStatus),
    /// Only the product's seller may answer.
    #[error("only the seller can answer this offer")]
    NotSeller,
}

/// The seller's answer to an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferResponse {
    Accept,
    Reject,
}

impl OfferResponse {
    /// Status the negotiation ends in.
    #[must_use]
    pub const fn outcome(self) -> NegotiationStatus {
        match self {
            Self::Accept => NegotiationStatus::Accepted,
            Self::Reject => NegotiationStatus::Rejected,
        }
    }
}

impl OfferPolicy {
    /// Validate a proposed price against the listed price.
    ///
    /// An offer passes only if `floor <= proposed < listed`.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError::BelowFloor`] or [`OfferError::NotBelowListed`].
    pub fn validate(&self, listed: Money, proposed: Money) -> Result<(), OfferError> {
        if proposed < self.floor {
            return Err(OfferError::BelowFloor { floor: self.floor });
        }
        if proposed >= listed {
            return Err(OfferError::NotBelowListed { listed });
        }
        Ok(())
    }

    /// Validate a complete offer, including who is making it.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError::OwnProduct`] when buyer and seller coincide, otherwise
    /// whatever [`OfferPolicy::validate`] returns.
    pub fn validate_offer(
        &self,
        buyer: UserId,
        seller: UserId,
        listed: Money,
        proposed: Money,
    ) -> Result<(), OfferError> {
        if buyer == seller {
            return Err(OfferError::OwnProduct);
        }
        self.validate(listed, proposed)
    }

    /// Re-check an offer against the current listed price before answering.
    ///
    /// The listed price may have dropped since the offer was made, so an
    /// acceptance must still satisfy `floor <= proposed < listed`. Rejecting
    /// is always possible.
    ///
    /// # Errors
    ///
    /// Returns whatever [`OfferPolicy::validate`] returns for an acceptance.
    pub fn check_answer(
        &self,
        response: OfferResponse,
        listed: Money,
        proposed: Money,
    ) -> Result<(), OfferError> {
        match response {
            OfferResponse::Accept => self.validate(listed, proposed),
            OfferResponse::Reject => Ok(()),
        }
    }
}

/// Check that `actor` may answer an offer currently in `status`.
///
/// # Errors
///
/// Returns [`OfferError::NotSeller`] or [`OfferError::AlreadyAnswered`].
pub fn respond(
    status: NegotiationStatus,
    seller: UserId,
    actor: UserId,
    response: OfferResponse,
) -> Result<NegotiationStatus, OfferError> {
    if actor != seller {
        return Err(OfferError::NotSeller);
    }
    if status != NegotiationStatus::Pending {
        return Err(OfferError::AlreadyAnswered(status));
    }
    Ok(response.outcome())
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_bounds() {
        let policy = OfferPolicy::default();
        let listed = Money::francs(10_000);

        assert_eq!(policy.validate(listed, Money::francs(500)), Ok(()));
        assert_eq!(policy.validate(listed, Money::francs(9_999)), Ok(()));
        assert_eq!(
            policy.validate(listed, Money::francs(499)),
            Err(OfferError::BelowFloor {
                floor: Money::francs(500)
            })
        );
        assert_eq!(
            policy.validate(listed, listed),
            Err(OfferError::NotBelowListed { listed })
        );
    }

    #[test]
    fn test_listed_at_floor_accepts_nothing() {
        let policy = OfferPolicy::default();
        let listed = Money::francs(500);
        assert!(policy.validate(listed, Money::francs(500)).is_err());
        assert!(policy.validate(listed, Money::francs(499)).is_err());
    }

    #[test]
    fn test_own_product() {
        let policy = OfferPolicy::default();
        assert_eq!(
            policy.validate_offer(
                UserId::new(3),
                UserId::new(3),
                Money::francs(10_000),
                Money::francs(5_000)
            ),
            Err(OfferError::OwnProduct)
        );
    }

    #[test]
    fn test_accepted_iff_floor_le_p_lt_q_randomized() {
        let mut rng = rand::rng();
        for _ in 0..1_000 {
            let floor = Money::francs(rng.random_range(0..2_000));
            let listed = Money::francs(rng.random_range(0..20_000));
            let proposed = Money::francs(rng.random_range(0..20_000));
            let policy = OfferPolicy { floor };

            let ok = policy.validate(listed, proposed).is_ok();
            assert_eq!(ok, floor <= proposed && proposed < listed);
        }
    }

    #[test]
    fn test_accept_rechecks_lowered_listed_price() {
        let policy = OfferPolicy::default();
        let proposed = Money::francs(8_000);

        assert_eq!(
            policy.check_answer(OfferResponse::Accept, Money::francs(10_000), proposed),
            Ok(())
        );
        assert_eq!(
            policy.check_answer(OfferResponse::Accept, Money::francs(5_000), proposed),
            Err(OfferError::NotBelowListed {
                listed: Money::francs(5_000)
            })
        );
        assert_eq!(
            policy.check_answer(OfferResponse::Reject, Money::francs(5_000), proposed),
            Ok(())
        );
    }

    #[test]
    fn test_respond() {
        let seller = UserId::new(5);
        assert_eq!(
            respond(NegotiationStatus::Pending, seller, seller, OfferResponse::Accept),
            Ok(NegotiationStatus::Accepted)
        );
        assert_eq!(
            respond(NegotiationStatus::Pending, seller, seller, OfferResponse::Reject),
            Ok(NegotiationStatus::Rejected)
        );
        assert_eq!(
            respond(NegotiationStatus::Pending, seller, UserId::new(6), OfferResponse::Accept),
            Err(OfferError::NotSeller)
        );
        assert_eq!(
            respond(NegotiationStatus::Rejected, seller, seller, OfferResponse::Accept),
            Err(OfferError::AlreadyAnswered(NegotiationStatus::Rejected))
        );
        assert_eq!(
            OfferError::AlreadyAnswered(NegotiationStatus::Accepted).to_string(),
            "offer has already been accepted"
        );
    }
}
