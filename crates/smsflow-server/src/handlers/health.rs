//! Liveness probe. No auth required.

use axum::Json;

/// `GET /health`
pub async fn handler() -> Json<bool> { Json(true) }
