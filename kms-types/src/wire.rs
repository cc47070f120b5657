//! Logical wire messages (§6). The core does not mandate a transport;
//! every implementation MUST preserve these field semantics.

use kms_core::{Fr, G1, G2};
use serde::{Deserialize, Serialize};

use crate::ids::{Epoch, NodeId};
use crate::model::{AttestationMethod, OperatorDirectoryEntry};

/// A dealer's share delivered point-to-point to one recipient. MUST be
/// confidentiality-protected by the transport (§6) — the core never frames
/// this for network transmission itself.
#[derive(Clone, Serialize, Deserialize)]
pub struct Deal {
    /// The dealer sending this share.
    pub dealer_id: NodeId,
    /// The epoch this deal belongs to.
    pub epoch: Epoch,
    /// The intended recipient.
    pub recipient_id: NodeId,
    /// `f_dealer(recipient_id)`.
    pub share: Fr,
    /// The dealer's published commitment vector, length `t`.
    pub commitments: Vec<G2>,
}

/// Query for a node's active commitment vector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PubKeyQuery;

/// Response to [`PubKeyQuery`] (§4.7 `getPubkey`).
#[derive(Clone, Serialize, Deserialize)]
pub struct PubKeyResponse {
    /// The responding operator's on-chain address, for rebinding the
    /// response to a `NodeId` on the client side (§7 security note).
    pub operator_address: alloy::primitives::Address,
    /// The active version's commitment vector.
    pub commitments: Vec<G2>,
    /// The active version's epoch.
    pub version: Epoch,
    /// Whether a version is active at all.
    pub is_active: bool,
}

/// Request for a partial signature over an application identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSignRequest {
    /// The application identity to sign for.
    pub app_id: Vec<u8>,
    /// Caller-supplied attestation timestamp, `0` if unused.
    pub attestation_time: u64,
}

/// Response to [`AppSignRequest`] (§4.7 `signApp`).
#[derive(Clone, Serialize, Deserialize)]
pub struct AppSignResponse {
    /// The responding operator's on-chain address (§7 security note: callers
    /// must derive `NodeId` from the *queried* operator, never this field).
    pub operator_address: alloy::primitives::Address,
    /// The derived node ID of the responder.
    pub node_id: NodeId,
    /// `x_j · hashToG1(appID)`.
    pub partial_signature: G1,
}

/// Request for an attested, envelope-encrypted partial signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsRequest {
    /// The application identity to sign for.
    pub app_id: Vec<u8>,
    /// Which attestation scheme produced `attestation`.
    pub attestation_method: AttestationMethod,
    /// The opaque attestation blob.
    pub attestation: Vec<u8>,
    /// An optional anti-replay challenge.
    pub challenge: Option<Vec<u8>>,
    /// An optional caller public key, method-dependent.
    pub public_key: Option<Vec<u8>>,
    /// The caller-supplied ephemeral RSA public key (DER, SPKI) used to
    /// envelope-encrypt the response.
    pub rsa_pub_key_tmp: Vec<u8>,
    /// Caller-supplied attestation timestamp.
    pub attest_time: u64,
}

/// Response to [`SecretsRequest`] (§4.7 `secrets`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsResponse {
    /// RSA-OAEP(SHA-256) ciphertext over the JSON serialization of the `G1`
    /// partial signature.
    pub encrypted_partial_sig: Vec<u8>,
    /// The release's encrypted environment, passed through unchanged.
    pub encrypted_env: Vec<u8>,
    /// The release's public environment, passed through unchanged.
    pub public_env: Vec<u8>,
}

/// The minimum RSA modulus length, in bits, accepted in production for
/// envelope encryption (Property Law 11).
pub const MIN_PRODUCTION_RSA_BITS: usize = 2048;

/// A snapshot of the operator set for one on-chain operator-set ID (§3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSet {
    /// The chain's opaque operator-set identifier.
    pub op_set_id: u64,
    /// The ordered operator directory.
    pub operators: Vec<OperatorDirectoryEntry>,
}
