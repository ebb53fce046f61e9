//! Price offer routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use mayombe_core::NegotiationId;
use mayombe_core::negotiation::OfferResponse;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Negotiation, NewOffer};
use crate::services::NegotiationService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(propose))
        .route("/{id}/accept", post(accept))
        .route("/{id}/reject", post(reject))
}

/// POST /api/negotiations
async fn propose(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<NewOffer>,
) -> Result<impl IntoResponse> {
    let negotiation = NegotiationService::new(&state).propose(&user, &body).await?;
    Ok((StatusCode::CREATED, Json(negotiation)))
}

/// GET /api/negotiations
async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Negotiation>>> {
    Ok(Json(NegotiationService::new(&state).list(&user).await?))
}

/// POST /api/negotiations/{id}/accept
async fn accept(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<NegotiationId>,
) -> Result<Json<Negotiation>> {
    let negotiation = NegotiationService::new(&state)
        .answer(&user, id, OfferResponse::Accept)
        .await?;
    Ok(Json(negotiation))
}

/// POST /api/negotiations/{id}/reject
async fn reject(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<NegotiationId>,
) -> Result<Json<Negotiation>> {
    let negotiation = NegotiationService::new(&state)
        .answer(&user, id, OfferResponse::Reject)
        .await?;
    Ok(Json(negotiation))
}
