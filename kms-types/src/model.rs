//! Persisted and in-protocol data model: key-share versions, commitments,
//! and the operator/committee membership records they reference.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use kms_core::{Fr, G2};

use crate::ids::{Epoch, NodeId};

/// The persisted record of one node's local secret share for a single epoch
/// (§3). Exactly one version is `is_active` at a time; activation is atomic
/// with respect to `app/sign`.
#[derive(Clone, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct KeyShareVersion {
    /// The epoch this version belongs to.
    #[zeroize(skip)]
    pub version: Epoch,
    /// This node's aggregate Shamir share `x_j` for `version`.
    pub private_share: Fr,
    /// The aggregated commitment vector across all accepted dealers,
    /// `[Σ_d C_d[k]]_k`, length equal to the epoch's threshold.
    #[zeroize(skip)]
    pub commitments: Vec<G2>,
    /// Whether this is the currently-active version served by `app/sign`.
    #[zeroize(skip)]
    pub is_active: bool,
    /// The sorted set of dealers whose contributions were accepted.
    #[zeroize(skip)]
    pub participant_ids: Vec<NodeId>,
}

impl KeyShareVersion {
    /// The master public key implied by this version's commitment vector:
    /// its constant term, `commitments[0]`.
    pub fn master_public_key(&self) -> Option<&G2> {
        self.commitments.first()
    }

    /// The threshold implied by this version: the length of the commitment
    /// vector (§3: "Commitment vector ... Its length equals the
    /// threshold.").
    pub fn threshold(&self) -> u32 {
        self.commitments.len() as u32
    }
}

/// A per-recipient acknowledgement binding `(player, dealer, epoch,
/// shareHash, commitmentHash)` (§3, §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// The operator who verified and is acknowledging the share.
    pub player_id: NodeId,
    /// The dealer whose share is being acknowledged.
    pub dealer_id: NodeId,
    /// The epoch this acknowledgement belongs to.
    pub epoch: Epoch,
    /// `keccak256(share.bytes)`.
    pub share_hash: [u8; 32],
    /// `keccak256(concat(compressed(c_k) for k in 0..t))`.
    pub commitment_hash: [u8; 32],
    /// Signature over `(dealerID, commitmentHash)` by the player's
    /// registered signing key. Opaque to the core: signature scheme and
    /// verification live in the transport/attestation layer (§1 scope).
    pub signature: Vec<u8>,
}

/// A sibling path proving a single leaf's membership in a posted Merkle
/// root (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The leaf's index within the dealer's canonicalized ack list.
    pub leaf_index: usize,
    /// Sibling hashes from the leaf level up to (but excluding) the root.
    pub siblings: Vec<[u8; 32]>,
}

/// A completion signature attesting that a node observed and accepted a new
/// epoch's commitment aggregate (§4.5, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSignature {
    /// The signing node.
    pub node_id: NodeId,
    /// The epoch being completed.
    pub epoch: Epoch,
    /// keccak256 of the new aggregated commitment vector.
    pub commitment_hash: [u8; 32],
    /// Signature over `(epoch, commitmentHash)`.
    pub signature: Vec<u8>,
}

/// One entry of the operator directory retrieved from the chain (§3, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDirectoryEntry {
    /// The operator's on-chain address; `NodeId` is derived from this.
    pub operator_address: Address,
    /// The network address other operators dial to reach this node.
    pub socket_address: String,
    /// The operator's registered ack-signing public key.
    pub public_key: Vec<u8>,
}

impl OperatorDirectoryEntry {
    /// This entry's derived `NodeId` (§6).
    pub fn node_id(&self) -> NodeId {
        crate::ids::derive_node_id(self.operator_address)
    }
}

/// The attestation method used by a `secrets` request (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationMethod {
    /// Google Cloud Confidential Space attestation token.
    Gcp,
    /// Intel TDX/SGX attestation quote.
    Intel,
    /// Non-production ECDSA dev-mode attestation.
    Ecdsa,
}

/// Claims extracted from a verified attestation (§6, §9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationClaims {
    /// The application identity the attestation was issued for.
    pub app_id: Vec<u8>,
    /// The attested workload's image digest.
    pub image_digest: String,
    /// Attestation issuance time, Unix seconds.
    pub issued_at: u64,
    /// The attested workload's ephemeral public key, if any.
    pub public_key: Option<Vec<u8>>,
}

/// A release record for an application identity (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// The expected image digest for this application.
    pub image_digest: String,
    /// Opaque environment ciphertext released alongside the image.
    pub encrypted_env: Vec<u8>,
    /// Opaque plaintext environment metadata released alongside the image.
    pub public_env: Vec<u8>,
    /// Release timestamp, Unix seconds.
    pub timestamp: u64,
}

/// A chain block/time event driving epoch scheduling (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvent {
    /// The block number.
    pub number: u64,
    /// The block timestamp, Unix seconds.
    pub timestamp: u64,
}
