//! Orchestrator-level errors (§7), covering the request-serving surface
//! that `kms-protocol`'s engines don't themselves know about.

use thiserror::Error;

pub use kms_protocol::ProtocolError;

/// Errors returned by the node's public operations (§4.7).
#[derive(Debug, Error)]
pub enum NodeError {
    /// Forwarded from a protocol engine.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No active key-share version exists yet.
    #[error("not ready: no active key-share version")]
    NotReady,

    /// Attestation failed, the method was disabled, the image digest did
    /// not match the release registry, the challenge expired, or a
    /// responder's self-reported address mismatched the queried address.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// An internal collaborator call (chain RPC, attestation verifier,
    /// secret manager) failed.
    #[error(transparent)]
    Internal(#[from] eyre::Error),
}

impl axum::response::IntoResponse for NodeError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let (status, message) = match &self {
            NodeError::NotReady => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            NodeError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            NodeError::Protocol(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            NodeError::Internal(_) => {
                tracing::error!(error = ?self, "internal error serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, message).into_response()
    }
}
