//! `getPubkey` (§4.7): read-only, never blocks on an ongoing epoch
//! transition — it only ever touches [`KeyShareStore::read_active`].

use alloy::primitives::Address;
use axum::{extract::State, routing::get, Json, Router};
use kms_types::{Epoch, PubKeyResponse};

use crate::services::key_share_store::KeyShareStore;

#[derive(Clone)]
struct PubkeyState {
    operator_address: Address,
    key_share_store: KeyShareStore,
}

pub(crate) fn routes(operator_address: Address, key_share_store: KeyShareStore) -> Router {
    Router::new().route("/pubkey", get(get_pubkey)).with_state(PubkeyState {
        operator_address,
        key_share_store,
    })
}

async fn get_pubkey(State(state): State<PubkeyState>) -> Json<PubKeyResponse> {
    match state.key_share_store.read_active() {
        Some(version) => Json(PubKeyResponse {
            operator_address: state.operator_address,
            commitments: version.commitments,
            version: version.version,
            is_active: version.is_active,
        }),
        None => Json(PubKeyResponse {
            operator_address: state.operator_address,
            commitments: Vec::new(),
            version: Epoch(0),
            is_active: false,
        }),
    }
}
