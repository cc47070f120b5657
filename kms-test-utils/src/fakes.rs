//! In-memory stand-ins for the collaborator traits in
//! `kms_types::collaborators`, for wiring up whole committees of
//! [`kms_node::KmsNodeBuilder`] instances in a single process without a
//! real chain, network, or secrets backend.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use kms_types::collaborators::{BlockSource, MerkleRootSink, OperatorDirectory, PeerTransport, ReleaseRegistry};
use kms_types::{
    Acknowledgement, BlockEvent, CompletionSignature, Deal, Epoch, NodeId, OperatorDirectoryEntry,
    OperatorSet, Release,
};
use parking_lot::Mutex;

/// A fixed operator set, as if retrieved once from the chain and never
/// changing mid-test.
pub struct StaticOperatorDirectory {
    set: OperatorSet,
}

impl StaticOperatorDirectory {
    pub fn new(op_set_id: u64, operators: Vec<OperatorDirectoryEntry>) -> Self {
        Self {
            set: OperatorSet {
                op_set_id,
                operators,
            },
        }
    }
}

#[async_trait]
impl OperatorDirectory for StaticOperatorDirectory {
    async fn get_operator_set(&self, _op_set_id: u64) -> eyre::Result<OperatorSet> {
        Ok(self.set.clone())
    }
}

/// A release registry backed by a fixed map, for exercising the `secrets`
/// endpoint without a real on-chain registry.
#[derive(Default)]
pub struct StaticReleaseRegistry {
    releases: HashMap<Vec<u8>, Release>,
}

impl StaticReleaseRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_release(mut self, app_id: Vec<u8>, release: Release) -> Self {
        self.releases.insert(app_id, release);
        self
    }
}

#[async_trait]
impl ReleaseRegistry for StaticReleaseRegistry {
    async fn get_release(&self, app_id: &[u8]) -> eyre::Result<Option<Release>> {
        Ok(self.releases.get(app_id).cloned())
    }
}

/// A Merkle-root sink that records every posted root, for asserting on
/// §4.6's ack-root publication in tests.
#[derive(Default)]
pub struct RecordingMerkleRootSink {
    posted: Mutex<Vec<(NodeId, Epoch, [u8; 32], usize)>>,
}

impl RecordingMerkleRootSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posted_roots(&self) -> Vec<(NodeId, Epoch, [u8; 32], usize)> {
        self.posted.lock().clone()
    }
}

#[async_trait]
impl MerkleRootSink for RecordingMerkleRootSink {
    async fn post_root(
        &self,
        dealer_id: NodeId,
        epoch: Epoch,
        root: [u8; 32],
        leaf_count: usize,
    ) -> eyre::Result<()> {
        self.posted.lock().push((dealer_id, epoch, root, leaf_count));
        Ok(())
    }
}

/// Drives every subscribed node's [`BlockSource`] in lockstep: each call to
/// [`Self::advance_to`] broadcasts one `BlockEvent` to all subscribers.
pub struct BlockEventPump {
    sender: tokio::sync::broadcast::Sender<BlockEvent>,
    next_number: u64,
}

impl BlockEventPump {
    pub fn new() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(256);
        Self {
            sender,
            next_number: 0,
        }
    }

    /// Hands out a fresh subscriber for one node's `BlockSource`.
    pub fn subscribe(&self) -> BroadcastBlockSource {
        BroadcastBlockSource {
            receiver: self.sender.subscribe(),
        }
    }

    /// Broadcasts a synthetic block at `timestamp` to every subscriber.
    pub fn advance_to(&mut self, timestamp: u64) {
        self.next_number += 1;
        let _ = self.sender.send(BlockEvent {
            number: self.next_number,
            timestamp,
        });
    }
}

impl Default for BlockEventPump {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`BlockSource`] fed by a [`BlockEventPump`].
pub struct BroadcastBlockSource {
    receiver: tokio::sync::broadcast::Receiver<BlockEvent>,
}

#[async_trait]
impl BlockSource for BroadcastBlockSource {
    async fn next_event(&mut self) -> eyre::Result<BlockEvent> {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => eyre::bail!("block event pump was dropped"),
            }
        }
    }
}

#[derive(Clone)]
enum NetMsg {
    Deal(Deal),
    Ack(Acknowledgement),
    Completion(CompletionSignature),
}

/// An in-process network routing `Deal`/`Ack`/`CompletionSignature`
/// traffic between a fixed committee of nodes, replacing a real
/// point-to-point transport for tests.
pub struct MemoryNetwork {
    mailboxes: HashMap<NodeId, Mutex<VecDeque<NetMsg>>>,
}

impl MemoryNetwork {
    pub fn new(committee: &[NodeId]) -> Arc<Self> {
        Arc::new(Self {
            mailboxes: committee
                .iter()
                .map(|&id| (id, Mutex::new(VecDeque::new())))
                .collect(),
        })
    }

    /// Returns a [`PeerTransport`] for `self_id` over this network.
    pub fn transport(self: &Arc<Self>, self_id: NodeId) -> NetworkPeerTransport {
        NetworkPeerTransport {
            self_id,
            network: self.clone(),
        }
    }

    fn push(&self, to: NodeId, msg: NetMsg) {
        if let Some(mailbox) = self.mailboxes.get(&to) {
            mailbox.lock().push_back(msg);
        }
    }

    fn broadcast(&self, msg: NetMsg) {
        for mailbox in self.mailboxes.values() {
            mailbox.lock().push_back(msg.clone());
        }
    }

    async fn collect<T>(
        &self,
        self_id: NodeId,
        from: &[NodeId],
        deadline: Duration,
        mut extract: impl FnMut(&NetMsg) -> Option<(NodeId, T)>,
    ) -> Vec<T> {
        let wanted: HashSet<NodeId> = from.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut collected = Vec::new();
        let deadline_instant = Instant::now() + deadline;
        loop {
            if let Some(mailbox) = self.mailboxes.get(&self_id) {
                let mut guard = mailbox.lock();
                let mut remaining = VecDeque::with_capacity(guard.len());
                while let Some(msg) = guard.pop_front() {
                    match extract(&msg) {
                        Some((sender, item)) if wanted.contains(&sender) && seen.insert(sender) => {
                            collected.push(item)
                        }
                        _ => remaining.push_back(msg),
                    }
                }
                *guard = remaining;
            }
            if collected.len() >= wanted.len() || Instant::now() >= deadline_instant {
                return collected;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// One node's view of a [`MemoryNetwork`].
pub struct NetworkPeerTransport {
    self_id: NodeId,
    network: Arc<MemoryNetwork>,
}

#[async_trait]
impl PeerTransport for NetworkPeerTransport {
    async fn send_deal(&self, deal: Deal) -> eyre::Result<()> {
        self.network.push(deal.recipient_id, NetMsg::Deal(deal));
        Ok(())
    }

    async fn broadcast_ack(&self, ack: Acknowledgement) -> eyre::Result<()> {
        self.network.broadcast(NetMsg::Ack(ack));
        Ok(())
    }

    async fn broadcast_completion(&self, signature: CompletionSignature) -> eyre::Result<()> {
        self.network.broadcast(NetMsg::Completion(signature));
        Ok(())
    }

    async fn collect_deals(
        &self,
        epoch: Epoch,
        from: &[NodeId],
        deadline: Duration,
    ) -> eyre::Result<Vec<Deal>> {
        Ok(self
            .network
            .collect(self.self_id, from, deadline, |msg| match msg {
                NetMsg::Deal(deal) if deal.epoch == epoch => Some((deal.dealer_id, deal.clone())),
                _ => None,
            })
            .await)
    }

    async fn collect_acks(
        &self,
        epoch: Epoch,
        from: &[NodeId],
        deadline: Duration,
    ) -> eyre::Result<Vec<Acknowledgement>> {
        Ok(self
            .network
            .collect(self.self_id, from, deadline, |msg| match msg {
                NetMsg::Ack(ack) if ack.epoch == epoch => Some((ack.player_id, ack.clone())),
                _ => None,
            })
            .await)
    }

    async fn collect_completions(
        &self,
        epoch: Epoch,
        from: &[NodeId],
        deadline: Duration,
    ) -> eyre::Result<Vec<CompletionSignature>> {
        Ok(self
            .network
            .collect(self.self_id, from, deadline, |msg| match msg {
                NetMsg::Completion(sig) if sig.epoch == epoch => Some((sig.node_id, sig.clone())),
                _ => None,
            })
            .await)
    }
}
