//! Single-node default collaborator implementations, for running
//! `kms-node` standalone during development without a chain indexer or
//! peer transport wired up yet.
//!
//! `Environment::Dev` relaxes these collaborators to a committee of
//! exactly one (this node), so DKG/Reshare degenerate to a trivial
//! local-only run instead of requiring real peers or a real chain feed.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use kms_types::collaborators::{
    AttestationVerifier, BlockSource, MerkleRootSink, OperatorDirectory, PeerTransport,
    ReleaseRegistry,
};
use kms_types::{
    Acknowledgement, BlockEvent, CompletionSignature, Deal, Epoch, NodeId,
    OperatorDirectoryEntry, OperatorSet, Release,
};

/// A fixed operator set containing exactly this node, for single-node dev
/// runs.
pub struct SingleOperatorDirectory {
    entry: OperatorDirectoryEntry,
}

impl SingleOperatorDirectory {
    pub fn new(operator_address: alloy::primitives::Address, socket_address: String) -> Self {
        Self {
            entry: OperatorDirectoryEntry {
                operator_address,
                socket_address,
                public_key: Vec::new(),
            },
        }
    }
}

#[async_trait]
impl OperatorDirectory for SingleOperatorDirectory {
    async fn get_operator_set(&self, op_set_id: u64) -> eyre::Result<OperatorSet> {
        Ok(OperatorSet {
            op_set_id,
            operators: vec![self.entry.clone()],
        })
    }
}

/// A release registry with no releases: the `secrets` endpoint always
/// returns `Unauthorized` until an operator wires a real registry.
pub struct EmptyReleaseRegistry;

#[async_trait]
impl ReleaseRegistry for EmptyReleaseRegistry {
    async fn get_release(&self, _app_id: &[u8]) -> eyre::Result<Option<Release>> {
        Ok(None)
    }
}

/// Logs posted roots instead of submitting them to an on-chain registry.
pub struct LoggingMerkleRootSink;

#[async_trait]
impl MerkleRootSink for LoggingMerkleRootSink {
    async fn post_root(
        &self,
        dealer_id: NodeId,
        epoch: Epoch,
        root: [u8; 32],
        leaf_count: usize,
    ) -> eyre::Result<()> {
        tracing::info!(%dealer_id, epoch = epoch.0, root = %alloy::primitives::B256::from(root), leaf_count, "posted ack-merkle root (dev sink)");
        Ok(())
    }
}

/// A dummy verifier that accepts any attestation blob as a claim for the
/// `appID` it was asked to verify against — usable only behind the
/// `ecdsa` dev-mode method, which the API layer gates on
/// `Environment::Dev`.
pub struct DevAttestationVerifier;

#[async_trait]
impl AttestationVerifier for DevAttestationVerifier {
    async fn verify(&self, attestation: &[u8]) -> eyre::Result<kms_types::AttestationClaims> {
        Ok(kms_types::AttestationClaims {
            app_id: attestation.to_vec(),
            image_digest: String::new(),
            issued_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            public_key: None,
        })
    }
}

/// A block source that synthesizes one `BlockEvent` per `tick_interval`
/// using wall-clock time, for driving the epoch scheduler without a real
/// chain subscription.
pub struct WallClockBlockSource {
    tick_interval: Duration,
    number: u64,
}

impl WallClockBlockSource {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            number: 0,
        }
    }
}

#[async_trait]
impl BlockSource for WallClockBlockSource {
    async fn next_event(&mut self) -> eyre::Result<BlockEvent> {
        tokio::time::sleep(self.tick_interval).await;
        self.number += 1;
        Ok(BlockEvent {
            number: self.number,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        })
    }
}

/// A transport with no peers: every send is a no-op and every collect
/// returns immediately empty. Correct only for a committee of size one,
/// where the local dealer's own contribution (inserted directly by the
/// scheduler) already satisfies the threshold.
pub struct NoPeersTransport;

#[async_trait]
impl PeerTransport for NoPeersTransport {
    async fn send_deal(&self, _deal: Deal) -> eyre::Result<()> {
        Ok(())
    }

    async fn broadcast_ack(&self, _ack: Acknowledgement) -> eyre::Result<()> {
        Ok(())
    }

    async fn broadcast_completion(&self, _signature: CompletionSignature) -> eyre::Result<()> {
        Ok(())
    }

    async fn collect_deals(
        &self,
        _epoch: Epoch,
        _from: &[NodeId],
        _deadline: Duration,
    ) -> eyre::Result<Vec<Deal>> {
        Ok(Vec::new())
    }

    async fn collect_acks(
        &self,
        _epoch: Epoch,
        _from: &[NodeId],
        _deadline: Duration,
    ) -> eyre::Result<Vec<Acknowledgement>> {
        Ok(Vec::new())
    }

    async fn collect_completions(
        &self,
        _epoch: Epoch,
        _from: &[NodeId],
        _deadline: Duration,
    ) -> eyre::Result<Vec<CompletionSignature>> {
        Ok(Vec::new())
    }
}
