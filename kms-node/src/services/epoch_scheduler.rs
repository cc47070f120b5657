//! Epoch scheduling: on first boot runs DKG, on every later
//! `RESHARE_INTERVAL` boundary runs Reshare, one transition at a time.
//!
//! Runs as a `tokio::select!`-driven background task wrapped in a
//! `CancellationToken` drop guard, driven by a generic `BlockSource` and
//! coordinating with peers through the `OperatorDirectory`/`PeerTransport`
//! collaborator traits.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use kms_core::{Fr, G2};
use kms_protocol::dkg::{self, DealtShares};
use kms_protocol::merkle::{self, AckMerkleTree};
use kms_protocol::reshare::{self, ReshareContribution};
use kms_types::collaborators::{BlockSource, MerkleRootSink, OperatorDirectory, PeerTransport};
use kms_types::{Acknowledgement, CompletionSignature, Epoch, KeyShareVersion, NodeId};
use rand::{CryptoRng, RngCore};
use tokio_util::sync::CancellationToken;

use crate::services::key_share_store::KeyShareStore;
use crate::services::secret_manager::SecretManager;

/// Everything the epoch loop needs to drive one node's side of DKG/Reshare.
/// Collaborators are trait objects: the loop itself is not generic over
/// their concrete backends (chain-indexed vs in-memory-fake, §6).
pub struct EpochSchedulerConfig {
    /// This node's derived identity.
    pub self_node_id: NodeId,
    /// The on-chain operator-set ID this node's committee belongs to.
    pub op_set_id: u64,
    pub block_source: Box<dyn BlockSource>,
    pub operator_directory: Arc<dyn OperatorDirectory>,
    pub peer_transport: Arc<dyn PeerTransport>,
    pub merkle_root_sink: Arc<dyn MerkleRootSink>,
    pub key_share_store: KeyShareStore,
    pub secret_manager: Arc<dyn SecretManager>,
    /// `RESHARE_INTERVAL` (§4.7): wall-clock epoch boundary spacing.
    pub reshare_interval: Duration,
    /// Per-epoch wall-clock budget (§5); expiry returns `Timeout`.
    pub epoch_timeout: Duration,
    /// Window within which a dealer collects acks before posting its root
    /// (§4.6).
    pub ack_window: Duration,
    pub cancellation_token: CancellationToken,
}

/// Runs the scheduling loop until cancelled. Exits with `Ok(())` on
/// cancellation; any other return is a fatal collaborator failure (the
/// caller should treat it like the watcher task's `drop_guard` pattern and
/// shut the node down).
pub async fn epoch_scheduler_task(
    mut cfg: EpochSchedulerConfig,
    rng: &mut (impl RngCore + CryptoRng),
) -> eyre::Result<()> {
    let mut next_epoch: u64 = 0;
    loop {
        let event = tokio::select! {
            event = cfg.block_source.next_event() => event?,
            _ = cfg.cancellation_token.cancelled() => return Ok(()),
        };
        if event.timestamp < next_epoch.saturating_mul(cfg.reshare_interval.as_secs()) {
            continue;
        }
        let epoch = Epoch(next_epoch);
        let operator_set = cfg
            .operator_directory
            .get_operator_set(cfg.op_set_id)
            .await?;
        let committee: Vec<NodeId> = operator_set
            .operators
            .iter()
            .map(|o| o.node_id())
            .collect();
        let threshold = kms_core::threshold(committee.len() as u32);

        let transition = tokio::time::timeout(cfg.epoch_timeout, async {
            if epoch.is_genesis() {
                run_dkg(&cfg, epoch, &committee, threshold, rng).await
            } else {
                let old = cfg
                    .key_share_store
                    .read_active()
                    .ok_or_else(|| eyre::eyre!("reshare boundary reached with no active version"))?;
                run_reshare(&cfg, epoch, &committee, threshold, &old, rng).await
            }
        })
        .await;

        match transition {
            Ok(Ok(version)) => {
                cfg.secret_manager.persist(&version).await?;
                cfg.key_share_store.install(version);
                metrics::counter!(crate::metrics::METRICS_ID_EPOCH_TRANSITIONS).increment(1);
                next_epoch += 1;
            }
            Ok(Err(err)) => {
                tracing::error!(epoch = epoch.0, error = ?err, "epoch transition failed");
            }
            Err(_) => {
                tracing::warn!(epoch = epoch.0, "epoch transition exceeded its wall-clock budget");
            }
        }
    }
}

async fn run_dkg(
    cfg: &EpochSchedulerConfig,
    epoch: Epoch,
    committee: &[NodeId],
    threshold: u32,
    rng: &mut (impl RngCore + CryptoRng),
) -> eyre::Result<KeyShareVersion> {
    let dealt = DealtShares::deal(committee, threshold, rng);
    let (commitments, shares) = dealt.into_parts();

    for &recipient in committee {
        if recipient == cfg.self_node_id {
            continue;
        }
        let share = shares[&recipient];
        cfg.peer_transport
            .send_deal(kms_types::Deal {
                dealer_id: cfg.self_node_id,
                epoch,
                recipient_id: recipient,
                share,
                commitments: commitments.clone(),
            })
            .await?;
    }

    let inbound = cfg
        .peer_transport
        .collect_deals(epoch, committee, cfg.epoch_timeout)
        .await?;

    let mut accepted: BTreeMap<NodeId, (Fr, Vec<G2>)> = BTreeMap::new();
    accepted.insert(cfg.self_node_id, (shares[&cfg.self_node_id], commitments.clone()));
    for deal in inbound {
        if dkg::verify_share(deal.dealer_id, &deal.share, &deal.commitments).is_ok() {
            accepted.insert(deal.dealer_id, (deal.share, deal.commitments.clone()));
            let ack = Acknowledgement {
                player_id: cfg.self_node_id,
                dealer_id: deal.dealer_id,
                epoch,
                share_hash: merkle::share_hash(&deal.share),
                commitment_hash: merkle::commitment_hash(&deal.commitments),
                signature: Vec::new(),
            };
            cfg.peer_transport.broadcast_ack(ack).await?;
        } else {
            metrics::counter!(crate::metrics::METRICS_ID_DEALERS_REJECTED).increment(1);
            tracing::warn!(dealer = %deal.dealer_id, "dropping dealer: Feldman verification failed");
        }
    }

    let participant_ids: Vec<NodeId> = accepted.keys().copied().collect();
    let (private_share, aggregate_commitments) = dkg::finalize(&accepted, threshold)?;

    post_own_ack_root(cfg, epoch, committee).await?;
    await_completion_quorum(cfg, epoch, committee, threshold, &aggregate_commitments).await?;

    Ok(KeyShareVersion {
        version: epoch,
        private_share,
        commitments: aggregate_commitments,
        is_active: false,
        participant_ids,
    })
}

async fn run_reshare(
    cfg: &EpochSchedulerConfig,
    epoch: Epoch,
    new_committee: &[NodeId],
    new_threshold: u32,
    old: &KeyShareVersion,
    rng: &mut (impl RngCore + CryptoRng),
) -> eyre::Result<KeyShareVersion> {
    let old_threshold = old.threshold();
    let contribution = ReshareContribution::deal(old.private_share, new_committee, new_threshold, rng);
    let (commitments, shares) = contribution.into_parts();

    for &recipient in new_committee {
        if recipient == cfg.self_node_id {
            continue;
        }
        let share = shares[&recipient];
        cfg.peer_transport
            .send_deal(kms_types::Deal {
                dealer_id: cfg.self_node_id,
                epoch,
                recipient_id: recipient,
                share,
                commitments: commitments.clone(),
            })
            .await?;
    }

    let inbound = cfg
        .peer_transport
        .collect_deals(epoch, new_committee, cfg.epoch_timeout)
        .await?;

    let mut accepted: BTreeMap<NodeId, (Fr, Vec<G2>)> = BTreeMap::new();
    if new_committee.contains(&cfg.self_node_id) {
        accepted.insert(cfg.self_node_id, (shares[&cfg.self_node_id], commitments.clone()));
    }
    for deal in inbound {
        let verdict = reshare::verify_reshare_contribution(
            deal.recipient_id,
            deal.dealer_id,
            &deal.share,
            &deal.commitments,
            &old.commitments,
        );
        if verdict.is_ok() {
            accepted.insert(deal.dealer_id, (deal.share, deal.commitments.clone()));
            let ack = Acknowledgement {
                player_id: cfg.self_node_id,
                dealer_id: deal.dealer_id,
                epoch,
                share_hash: merkle::share_hash(&deal.share),
                commitment_hash: merkle::commitment_hash(&deal.commitments),
                signature: Vec::new(),
            };
            cfg.peer_transport.broadcast_ack(ack).await?;
        } else {
            metrics::counter!(crate::metrics::METRICS_ID_DEALERS_REJECTED).increment(1);
            tracing::warn!(dealer = %deal.dealer_id, error = ?verdict, "dropping reshare dealer");
        }
    }

    let participant_ids: Vec<NodeId> = accepted.keys().copied().collect();
    let (private_share, aggregate_commitments) = reshare::finalize_reshare(&accepted, old_threshold)?;
    debug_assert_eq!(aggregate_commitments.first(), old.commitments.first());

    post_own_ack_root(cfg, epoch, new_committee).await?;
    await_completion_quorum(cfg, epoch, new_committee, new_threshold, &aggregate_commitments).await?;

    Ok(KeyShareVersion {
        version: epoch,
        private_share,
        commitments: aggregate_commitments,
        is_active: false,
        participant_ids,
    })
}

/// Posts this node's own ack-Merkle root once it has accepted acks from the
/// rest of the committee, ordered after receiving `n-1` acks as §5 requires.
async fn post_own_ack_root(
    cfg: &EpochSchedulerConfig,
    epoch: Epoch,
    committee: &[NodeId],
) -> eyre::Result<()> {
    let peers: Vec<NodeId> = committee
        .iter()
        .copied()
        .filter(|&id| id != cfg.self_node_id)
        .collect();
    let acks = cfg
        .peer_transport
        .collect_acks(epoch, &peers, cfg.ack_window)
        .await?;
    if acks.is_empty() {
        return Ok(());
    }
    let tree = AckMerkleTree::build(&acks);
    cfg.merkle_root_sink
        .post_root(cfg.self_node_id, epoch, tree.root(), tree.leaf_count())
        .await
}

/// Broadcasts this node's own completion signature and blocks until a
/// `threshold`-sized quorum of the committee has signed the same
/// commitment vector (§4.7, §5 ordering guarantee).
async fn await_completion_quorum(
    cfg: &EpochSchedulerConfig,
    epoch: Epoch,
    committee: &[NodeId],
    threshold: u32,
    commitments: &[G2],
) -> eyre::Result<()> {
    let expected_hash = merkle::commitment_hash(commitments);
    cfg.peer_transport
        .broadcast_completion(CompletionSignature {
            node_id: cfg.self_node_id,
            epoch,
            commitment_hash: expected_hash,
            signature: Vec::new(),
        })
        .await?;

    let completions = cfg
        .peer_transport
        .collect_completions(epoch, committee, cfg.epoch_timeout)
        .await?;
    let agreeing = completions
        .iter()
        .filter(|c| c.commitment_hash == expected_hash)
        .count();
    if (agreeing as u32) < threshold {
        eyre::bail!(
            "only {agreeing} of {threshold} required completion signatures agreed on the new commitment aggregate"
        );
    }
    Ok(())
}
