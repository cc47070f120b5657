//! `secrets` (§4.7, §6, §7 Property Law 11): an attested, envelope-encrypted
//! variant of `signApp`. The attestation blob is verified and its claimed
//! `imageDigest` checked against the release registry before a partial
//! signature is produced; the response envelope-encrypts it under the
//! caller-supplied ephemeral RSA key.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use kms_core::G1;
use kms_types::collaborators::{AttestationVerifierRegistry, ReleaseRegistry};
use kms_types::wire::MIN_PRODUCTION_RSA_BITS;
use kms_types::{AttestationMethod, SecretsRequest, SecretsResponse};
use rsa::pkcs8::DecodePublicKey as _;
use rsa::Oaep;
use sha2::Sha256;

use crate::config::Environment;
use crate::error::NodeError;
use crate::services::key_share_store::KeyShareStore;

#[derive(Clone)]
pub(crate) struct SecretsState {
    pub environment: Environment,
    pub min_rsa_bits: usize,
    pub attestation_registry: Arc<dyn AttestationVerifierRegistry>,
    pub release_registry: Arc<dyn ReleaseRegistry>,
    pub key_share_store: KeyShareStore,
}

pub(crate) fn routes(state: SecretsState) -> Router {
    Router::new().route("/secrets", post(secrets)).with_state(state)
}

fn method_name(method: AttestationMethod) -> &'static str {
    match method {
        AttestationMethod::Gcp => "gcp",
        AttestationMethod::Intel => "intel",
        AttestationMethod::Ecdsa => "ecdsa",
    }
}

async fn secrets(
    State(state): State<SecretsState>,
    Json(request): Json<SecretsRequest>,
) -> Result<Json<SecretsResponse>, NodeError> {
    metrics::counter!(crate::metrics::METRICS_ID_SECRETS_REQUESTS).increment(1);

    if request.attestation_method == AttestationMethod::Ecdsa {
        state.environment.assert_is_dev();
    }

    let verifier = state
        .attestation_registry
        .verifier(method_name(request.attestation_method))
        .ok_or_else(|| NodeError::Unauthorized("attestation method disabled".into()))?;
    let claims = verifier
        .verify(&request.attestation)
        .await
        .map_err(|_| NodeError::Unauthorized("attestation verification failed".into()))?;
    if claims.app_id != request.app_id {
        return Err(NodeError::Unauthorized(
            "attestation app identity mismatch".into(),
        ));
    }

    let release = state
        .release_registry
        .get_release(&request.app_id)
        .await?
        .ok_or_else(|| NodeError::Unauthorized("no release registered for app".into()))?;
    if release.image_digest != claims.image_digest {
        return Err(NodeError::Unauthorized("image digest mismatch".into()));
    }

    let version = state
        .key_share_store
        .read_active()
        .ok_or(NodeError::NotReady)?;
    let q_id = G1::hash_to_curve(&request.app_id);
    let partial_signature = q_id.scalar_mul(&version.private_share);

    let rsa_key = rsa::RsaPublicKey::from_public_key_der(&request.rsa_pub_key_tmp)
        .map_err(|_| NodeError::Unauthorized("invalid RSA public key".into()))?;
    let min_bits = if state.environment == Environment::Prod {
        state.min_rsa_bits.max(MIN_PRODUCTION_RSA_BITS)
    } else {
        state.min_rsa_bits
    };
    if rsa::traits::PublicKeyParts::size(&rsa_key) * 8 < min_bits {
        return Err(NodeError::Unauthorized("RSA key too short".into()));
    }

    let serialized = serde_json::to_vec(&partial_signature)
        .map_err(|err| NodeError::Internal(eyre::eyre!(err)))?;
    let mut rng = rand::thread_rng();
    let encrypted_partial_sig = rsa_key
        .encrypt(&mut rng, Oaep::new::<Sha256>(), &serialized)
        .map_err(|err| NodeError::Internal(eyre::eyre!(err)))?;

    Ok(Json(SecretsResponse {
        encrypted_partial_sig,
        encrypted_env: release.encrypted_env,
        public_env: release.public_env,
    }))
}
