//! Liveness/readiness endpoints.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};

use crate::services::key_share_store::KeyShareStore;

/// `/health/live` always answers once the process is up; `/health/ready`
/// answers `200` only once an active `KeyShareVersion` exists (§4.7
/// `getPubkey`/`signApp` otherwise return `NotReady`).
pub(crate) fn routes(key_share_store: KeyShareStore) -> Router {
    Router::new()
        .route("/health/live", get(live))
        .route(
            "/health/ready",
            get(move || ready(key_share_store.clone())),
        )
}

async fn live() -> impl IntoResponse {
    StatusCode::OK
}

async fn ready(key_share_store: KeyShareStore) -> impl IntoResponse {
    if key_share_store.is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}
