//! Informational pages.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::header::CACHE_CONTROL,
    response::IntoResponse,
    routing::get,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{slug}", get(show))
}

/// GET /api/pages/{slug}
async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<impl IntoResponse> {
    let page = state
        .content()
        .get_page(&slug)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Page".to_string()))?;

    Ok(([(CACHE_CONTROL, "public, max-age=300")], Json(page)))
}
