//! `signApp` (§4.7): `partialSig = x_j · hashToG1(appID)` over the active
//! private share.

use axum::{extract::State, routing::post, Json, Router};
use kms_core::G1;
use kms_types::{AppSignRequest, AppSignResponse, NodeId};

use crate::error::NodeError;
use crate::services::key_share_store::KeyShareStore;

#[derive(Clone)]
struct AppSignState {
    operator_address: alloy::primitives::Address,
    self_node_id: NodeId,
    key_share_store: KeyShareStore,
}

pub(crate) fn routes(
    operator_address: alloy::primitives::Address,
    self_node_id: NodeId,
    key_share_store: KeyShareStore,
) -> Router {
    Router::new()
        .route("/sign", post(sign_app))
        .with_state(AppSignState {
            operator_address,
            self_node_id,
            key_share_store,
        })
}

async fn sign_app(
    State(state): State<AppSignState>,
    Json(request): Json<AppSignRequest>,
) -> Result<Json<AppSignResponse>, NodeError> {
    metrics::counter!(crate::metrics::METRICS_ID_APP_SIGN_REQUESTS).increment(1);
    let version = state.key_share_store.read_active().ok_or(NodeError::NotReady)?;
    let q_id = G1::hash_to_curve(&request.app_id);
    let partial_signature = q_id.scalar_mul(&version.private_share);
    Ok(Json(AppSignResponse {
        operator_address: state.operator_address,
        node_id: state.self_node_id,
        partial_signature,
    }))
}
