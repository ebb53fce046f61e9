//! Order routes: checkout, lifecycle, assignment, event stream, payouts.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use mayombe_core::OrderId;
use mayombe_core::order::OrderTransition;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{AssignRequest, CheckoutRequest, CurrentUser, Order, VendorPayout};
use crate::services::OrderService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(checkout))
        .route("/events", get(events))
        .route("/{id}", get(show))
        .route("/{id}/confirm", post(confirm))
        .route("/{id}/ship", post(ship))
        .route("/{id}/pick-up", post(pick_up))
        .route("/{id}/deliver", post(deliver))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/assign", post(assign))
}

/// POST /api/orders
async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let order = OrderService::new(&state).checkout(&user, &body).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders
async fn list(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderService::new(&state).list(&user).await?))
}

/// GET /api/orders/{id}
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(OrderService::new(&state).get(&user, id).await?))
}

async fn change_status(
    state: &AppState,
    user: &CurrentUser,
    id: OrderId,
    transition: OrderTransition,
) -> Result<Json<Order>> {
    Ok(Json(
        OrderService::new(state)
            .transition(user, id, transition)
            .await?,
    ))
}

/// POST /api/orders/{id}/confirm
async fn confirm(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    change_status(&state, &user, id, OrderTransition::Confirm).await
}

/// POST /api/orders/{id}/ship
async fn ship(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    change_status(&state, &user, id, OrderTransition::Ship).await
}

/// POST /api/orders/{id}/pick-up
async fn pick_up(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    change_status(&state, &user, id, OrderTransition::PickUp).await
}

/// POST /api/orders/{id}/deliver
async fn deliver(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    change_status(&state, &user, id, OrderTransition::Deliver).await
}

/// POST /api/orders/{id}/cancel
async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    change_status(&state, &user, id, OrderTransition::Cancel).await
}

/// Admins send `{"logistician_id": ..}`; logisticians send `{}` to claim.
///
/// POST /api/orders/{id}/assign
async fn assign(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    body: Option<Json<AssignRequest>>,
) -> Result<Json<Order>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(
        OrderService::new(&state).assign(&user, id, &request).await?,
    ))
}

/// Stream order changes that involve the user. Admins receive every event.
/// A subscriber that falls behind skips the events it missed.
///
/// GET /api/orders/events
async fn events(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let mut receiver = state.events().subscribe();
    tracing::debug!(user_id = %user.id, "Order event stream opened");

    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if !event.involves(user.id, user.role) {
                        continue;
                    }
                    match Event::default().event("order").json_data(&event) {
                        Ok(sse) => yield Ok(sse),
                        Err(e) => tracing::warn!(error = %e, "Failed to encode order event"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(user_id = %user.id, skipped, "Order event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/payouts
pub async fn payouts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<VendorPayout>>> {
    Ok(Json(OrderService::new(&state).payouts(&user).await?))
}
