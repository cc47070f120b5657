//! `/version` and `/operator` info endpoints. This node serves exactly one
//! active key-share version rather than a keyed collection; the public-key
//! lookup role is covered by [`crate::api::pubkey`] instead.

use alloy::primitives::Address;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

/// All responses carry `Cache-Control: no-cache`.
pub(crate) fn routes(operator_address: Address) -> Router {
    Router::new()
        .route("/version", get(version))
        .route("/operator", get(move || operator(operator_address)))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
}

async fn version() -> impl IntoResponse {
    (
        StatusCode::OK,
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
    )
}

async fn operator(operator_address: Address) -> impl IntoResponse {
    (StatusCode::OK, operator_address.to_string())
}
