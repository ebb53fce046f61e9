//! Price offers between buyers and sellers.

use tracing::instrument;

use mayombe_core::negotiation::{OfferError, OfferResponse, respond};
use mayombe_core::{NegotiationId, NegotiationStatus, Role};

use crate::db::{NegotiationRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{CurrentUser, Negotiation, NewOffer};
use crate::state::AppState;

/// Negotiation workflow: propose, list, accept or reject.
pub struct NegotiationService<'a> {
    state: &'a AppState,
}

impl<'a> NegotiationService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn negotiations(&self) -> NegotiationRepository<'a> {
        NegotiationRepository::new(self.state.pool())
    }

    /// Propose a price for an active product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product is missing or inactive and
    /// `AppError::Offer` if the price is out of bounds, the user sells the
    /// product, or an offer is already pending.
    #[instrument(skip(self, user, offer), fields(user_id = %user.id, product_id = %offer.product_id))]
    pub async fn propose(&self, user: &CurrentUser, offer: &NewOffer) -> Result<Negotiation> {
        let product = ProductRepository::new(self.state.pool())
            .get(offer.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        self.state.offer_policy().validate_offer(
            user.id,
            product.seller_id,
            product.price,
            offer.proposed_price,
        )?;

        let negotiation = self
            .negotiations()
            .create(
                product.id,
                user.id,
                product.seller_id,
                product.price,
                offer.proposed_price,
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AppError::Offer(OfferError::AlreadyPending),
                other => other.into(),
            })?;

        tracing::info!(negotiation_id = %negotiation.id, "Offer proposed");
        Ok(negotiation)
    }

    /// Offers relevant to the user: received ones for vendors, own ones for
    /// everyone else.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, user: &CurrentUser) -> Result<Vec<Negotiation>> {
        let negotiations = self.negotiations();
        let list = if user.role == Role::Vendor {
            negotiations.list_for_seller(user.id).await?
        } else {
            negotiations.list_for_buyer(user.id).await?
        };
        Ok(list)
    }

    /// Accept or reject a pending offer on one of the user's products.
    ///
    /// The write only succeeds while the offer is still pending, so two
    /// concurrent answers cannot both win.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown offer and `AppError::Offer`
    /// if the user is not the seller, the offer was already answered, or an
    /// acceptance is no longer below the current listed price.
    #[instrument(skip(self, user), fields(user_id = %user.id, negotiation_id = %id))]
    pub async fn answer(
        &self,
        user: &CurrentUser,
        id: NegotiationId,
        response: OfferResponse,
    ) -> Result<Negotiation> {
        let negotiations = self.negotiations();
        let current = negotiations
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Negotiation".to_string()))?;

        let product = ProductRepository::new(self.state.pool())
            .get(current.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let outcome = respond(current.status, current.seller_id, user.id, response)?;
        self.state
            .offer_policy()
            .check_answer(response, product.price, current.proposed_price)?;

        let Some(answered) = negotiations.respond(id, outcome).await? else {
            let status = negotiations
                .get(id)
                .await?
                .map_or(NegotiationStatus::Rejected, |n| n.status);
            return Err(OfferError::AlreadyAnswered(status).into());
        };

        add_breadcrumb(
            "negotiation",
            "Offer answered",
            Some(&[("negotiation_id", &answered.id.to_string())]),
        );
        self.state
            .notifier()
            .negotiation_answered(&answered, &product.name);

        Ok(answered)
    }
}
