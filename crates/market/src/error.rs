//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Responses carry a JSON body
//! `{"error": "..."}`; server errors are captured to Sentry and their details
//! never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use mayombe_core::cart::CartError;
use mayombe_core::negotiation::OfferError;
use mayombe_core::order::TransitionError;
use mayombe_core::payout::PayoutError;
use mayombe_core::MoneyError;
use mayombe_core::rating::RatingError;

use crate::db::{CheckoutError, RepositoryError};
use crate::services::auth::AuthError;

/// Application-level error type for the market API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order status change refused.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    /// Price offer refused.
    #[error("{0}")]
    Offer(#[from] OfferError),

    /// Invalid cart input.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// Invalid amount.
    #[error("{0}")]
    Money(#[from] MoneyError),

    /// Rating refused.
    #[error("{0}")]
    Rating(#[from] RatingError),

    /// Payout release refused.
    #[error("{0}")]
    Payout(#[from] PayoutError),

    /// Checkout refused.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with the current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) | Self::Checkout(CheckoutError::Repository(err)) => {
                repository_status(err)
            }
            Self::Internal(_) | Self::Payout(PayoutError::Money(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::MissingName => StatusCode::BAD_REQUEST,
                AuthError::RoleNotAllowed(_) => StatusCode::FORBIDDEN,
                AuthError::Repository(err) => repository_status(err),
                AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Transition(err) => match err {
                TransitionError::InvalidFrom { .. } | TransitionError::Stale { .. } => {
                    StatusCode::CONFLICT
                }
                TransitionError::Forbidden { .. } => StatusCode::FORBIDDEN,
            },
            Self::Offer(err) => match err {
                OfferError::BelowFloor { .. }
                | OfferError::NotBelowListed { .. }
                | OfferError::OwnProduct => StatusCode::BAD_REQUEST,
                OfferError::AlreadyPending | OfferError::AlreadyAnswered(_) => {
                    StatusCode::CONFLICT
                }
                OfferError::NotSeller => StatusCode::FORBIDDEN,
            },
            Self::Cart(_) | Self::Money(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rating(err) => match err {
                RatingError::NotPurchased => StatusCode::FORBIDDEN,
                RatingError::StarsOutOfRange | RatingError::CommentTooLong { .. } => {
                    StatusCode::BAD_REQUEST
                }
            },
            Self::Payout(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::Money(_) => StatusCode::BAD_REQUEST,
                CheckoutError::Unavailable(_) | CheckoutError::OutOfStock { .. } => {
                    StatusCode::CONFLICT
                }
                CheckoutError::Repository(err) => repository_status(err),
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Database(err)
            | Self::Auth(AuthError::Repository(err))
            | Self::Checkout(CheckoutError::Repository(err)) => match err {
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Not found".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                other => other.to_string(),
            },
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(serde_json::json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a profile.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("order", "Order confirmed", Some(&[("order_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::body::to_bytes;
    use mayombe_core::order::OrderTransition;
    use mayombe_core::{Money, NegotiationStatus, OrderStatus};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_of(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_error_status_codes() {
        assert_eq!(
            get_status(
                TransitionError::InvalidFrom {
                    transition: OrderTransition::Ship,
                    from: OrderStatus::Pending,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                TransitionError::Stale {
                    expected: OrderStatus::Confirmed
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                TransitionError::Forbidden {
                    transition: OrderTransition::Deliver
                }
                .into()
            ),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(
                OfferError::BelowFloor {
                    floor: Money::francs(500)
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(OfferError::AlreadyAnswered(NegotiationStatus::Accepted).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RatingError::NotPurchased.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("taken".to_string()).into()),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let body = body_of(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["error"], "Internal server error");

        let body = body_of(RepositoryError::DataCorruption("bad row".to_string()).into()).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_client_errors_have_json_message() {
        let body = body_of(OfferError::OwnProduct.into()).await;
        assert_eq!(body["error"], "cannot make an offer on your own product");

        let body = body_of(AppError::NotFound("order".to_string())).await;
        assert_eq!(body["error"], "order not found");
    }
}
