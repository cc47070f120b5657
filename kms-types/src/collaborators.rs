//! Interfaces for the systems the core treats as external collaborators:
//! the chain-indexed operator directory and release registry, the
//! remote-attestation verifier, the Merkle-root sink, and the block/time
//! source. The core consumes only these traits; concrete chain-indexer,
//! TEE-verifier, and transport implementations live outside this crate.

use async_trait::async_trait;

use crate::ids::{Epoch, NodeId};
use crate::model::{Acknowledgement, AttestationClaims, BlockEvent, CompletionSignature, Release};
use crate::wire::{Deal, OperatorSet};

/// `getOperatorSet(avs, opSetID) -> [{address, socketAddress, publicKey}]`
/// (§6).
#[async_trait]
pub trait OperatorDirectory: Send + Sync {
    /// Fetches the operator set registered for `op_set_id`.
    async fn get_operator_set(&self, op_set_id: u64) -> eyre::Result<OperatorSet>;
}

/// `getRelease(appID) -> {imageDigest, encryptedEnv, publicEnv, timestamp}`
/// (§6).
#[async_trait]
pub trait ReleaseRegistry: Send + Sync {
    /// Fetches the release record for `app_id`, if one exists.
    async fn get_release(&self, app_id: &[u8]) -> eyre::Result<Option<Release>>;
}

/// `verify(request) -> AttestationClaims | failure` (§6), keyed by method
/// name as §9's "pluggable attestation" design note prescribes.
#[async_trait]
pub trait AttestationVerifier: Send + Sync {
    /// Verifies an opaque attestation blob and extracts its claims.
    async fn verify(&self, attestation: &[u8]) -> eyre::Result<AttestationClaims>;
}

/// A registry of [`AttestationVerifier`]s keyed by method name (`"gcp"`,
/// `"intel"`, `"ecdsa"`), per §9.
pub trait AttestationVerifierRegistry: Send + Sync {
    /// Looks up the verifier registered for `method`, if enabled.
    fn verifier(&self, method: &str) -> Option<&dyn AttestationVerifier>;
}

/// `postRoot(dealerAddress, epoch, root, leafCount) -> receipt` (§6).
#[async_trait]
pub trait MerkleRootSink: Send + Sync {
    /// Posts a dealer's ack-Merkle root for one epoch to the registry.
    async fn post_root(
        &self,
        dealer_id: NodeId,
        epoch: crate::ids::Epoch,
        root: [u8; 32],
        leaf_count: usize,
    ) -> eyre::Result<()>;
}

/// A monotonic stream of `{number, timestamp}` events driving epoch
/// scheduling (§6).
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Blocks until the next block/time event is available.
    async fn next_event(&mut self) -> eyre::Result<BlockEvent>;
}

/// The peer-to-peer transport carrying Deal/Ack/CompletionSig traffic
/// during an epoch transition (§5, §6). The core treats this as opaque:
/// "the core does not mandate a specific transport, but every
/// implementation MUST preserve field semantics" (§6). `Deal` delivery MUST
/// be point-to-point and confidentiality-protected by the implementation;
/// acks and completion signatures are broadcast to the whole committee.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Delivers `deal` to its intended recipient.
    async fn send_deal(&self, deal: Deal) -> eyre::Result<()>;

    /// Broadcasts `ack` to the committee.
    async fn broadcast_ack(&self, ack: Acknowledgement) -> eyre::Result<()>;

    /// Broadcasts `signature` to the committee.
    async fn broadcast_completion(&self, signature: CompletionSignature) -> eyre::Result<()>;

    /// Collects deals addressed to this node for `epoch` until `deadline`
    /// elapses or every expected dealer in `from` has been heard from.
    async fn collect_deals(
        &self,
        epoch: Epoch,
        from: &[NodeId],
        deadline: std::time::Duration,
    ) -> eyre::Result<Vec<Deal>>;

    /// Collects acks addressed to this node (as dealer) for `epoch` until
    /// `deadline` elapses or every recipient in `from` has acked.
    async fn collect_acks(
        &self,
        epoch: Epoch,
        from: &[NodeId],
        deadline: std::time::Duration,
    ) -> eyre::Result<Vec<Acknowledgement>>;

    /// Collects completion signatures for `epoch` until `deadline` elapses
    /// or every member of `from` has signed.
    async fn collect_completions(
        &self,
        epoch: Epoch,
        from: &[NodeId],
        deadline: std::time::Duration,
    ) -> eyre::Result<Vec<CompletionSignature>>;
}
