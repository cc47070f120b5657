//! Core functionality of a distributed threshold KMS node.
//!
//! The main entry point is [`KmsNodeBuilder`]: it wires the collaborator
//! implementations supplied by the hosting binary (chain-indexed operator
//! directory, release registry, attestation registry, Merkle-root sink,
//! block source, peer transport, secret manager) into the cryptographic
//! core and returns an `axum::Router` plus a `JoinHandle` for the epoch
//! scheduler's background task. If the scheduler encounters a fatal
//! collaborator error, it cancels the builder's `CancellationToken`, letting
//! the hosting binary shut down gracefully.

use std::sync::Arc;

use axum::Router;
use kms_types::collaborators::{
    AttestationVerifierRegistry, BlockSource, MerkleRootSink, OperatorDirectory, PeerTransport,
    ReleaseRegistry,
};
use rand::{CryptoRng, RngCore};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::api::secrets::SecretsState;
use crate::config::KmsNodeConfig;
use crate::services::epoch_scheduler::{epoch_scheduler_task, EpochSchedulerConfig};
use crate::services::key_share_store::KeyShareStore;
use crate::services::secret_manager::SecretManager;

pub(crate) mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod services;

pub use error::NodeError;
pub use services::key_share_store;
pub use services::secret_manager;

/// Collaborator implementations supplied by the hosting binary. The core
/// never constructs these itself.
pub struct NodeCollaborators {
    pub operator_directory: Arc<dyn OperatorDirectory>,
    pub release_registry: Arc<dyn ReleaseRegistry>,
    pub attestation_registry: Arc<dyn AttestationVerifierRegistry>,
    pub merkle_root_sink: Arc<dyn MerkleRootSink>,
    pub block_source: Box<dyn BlockSource>,
    pub peer_transport: Arc<dyn PeerTransport>,
    pub secret_manager: Arc<dyn SecretManager>,
}

/// Builds a KMS node: the HTTP API router and the epoch-scheduler
/// background task.
pub struct KmsNodeBuilder {
    self_node_id: kms_types::NodeId,
    op_set_id: u64,
    key_share_store: KeyShareStore,
    router: Router,
    epoch_scheduler: tokio::task::JoinHandle<eyre::Result<()>>,
}

impl KmsNodeBuilder {
    /// Initializes a node: recovers any persisted active version, spawns
    /// the epoch scheduler, and assembles the HTTP routes.
    pub async fn init(
        config: KmsNodeConfig,
        op_set_id: u64,
        collaborators: NodeCollaborators,
        cancellation_token: CancellationToken,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> eyre::Result<Self> {
        config.validate()?;
        crate::metrics::install_noop_recorder_if_unset();

        let self_node_id = kms_types::derive_node_id(config.operator_address);
        let key_share_store = KeyShareStore::new();
        if let Some(recovered) = collaborators.secret_manager.load_active().await? {
            tracing::info!(epoch = recovered.version.0, "recovered persisted key-share version");
            key_share_store.install(recovered);
        }

        tracing::info!("spawning epoch scheduler..");
        let scheduler_config = EpochSchedulerConfig {
            self_node_id,
            op_set_id,
            block_source: collaborators.block_source,
            operator_directory: collaborators.operator_directory.clone(),
            peer_transport: collaborators.peer_transport,
            merkle_root_sink: collaborators.merkle_root_sink,
            key_share_store: key_share_store.clone(),
            secret_manager: collaborators.secret_manager.clone(),
            reshare_interval: config.reshare_interval,
            epoch_timeout: config.epoch_timeout,
            ack_window: config.ack_window,
            cancellation_token: cancellation_token.clone(),
        };
        let mut scheduler_rng = rng_clone_seed(rng);
        let epoch_scheduler = tokio::spawn(async move {
            let result = epoch_scheduler_task(scheduler_config, &mut scheduler_rng).await;
            if let Err(ref err) = result {
                tracing::error!(error = ?err, "epoch scheduler failed, shutting node down");
            }
            cancellation_token.cancel();
            result
        });

        let router = Router::new()
            .merge(crate::api::health::routes(key_share_store.clone()))
            .merge(crate::api::info::routes(config.operator_address))
            .merge(crate::api::pubkey::routes(
                config.operator_address,
                key_share_store.clone(),
            ))
            .merge(crate::api::app_sign::routes(
                config.operator_address,
                self_node_id,
                key_share_store.clone(),
            ))
            .merge(crate::api::secrets::routes(SecretsState {
                environment: config.environment,
                min_rsa_bits: config.min_rsa_bits,
                attestation_registry: collaborators.attestation_registry,
                release_registry: collaborators.release_registry,
                key_share_store: key_share_store.clone(),
            }))
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            self_node_id,
            op_set_id,
            key_share_store,
            router,
            epoch_scheduler,
        })
    }

    /// This node's derived identity.
    pub fn self_node_id(&self) -> kms_types::NodeId {
        self.self_node_id
    }

    /// The operator-set ID this node's committee belongs to.
    pub fn op_set_id(&self) -> u64 {
        self.op_set_id
    }

    /// A handle onto the shared key-share store, for diagnostics (e.g.
    /// `kms-inspect`).
    pub fn key_share_store(&self) -> KeyShareStore {
        self.key_share_store.clone()
    }

    /// Finishes building the node: returns the assembled `axum::Router` and
    /// a `JoinHandle` for the epoch scheduler's background task. The
    /// hosting binary should await the handle after cancelling the token
    /// passed to [`Self::init`] to ensure a graceful shutdown.
    pub fn build(self) -> (Router, tokio::task::JoinHandle<eyre::Result<()>>) {
        (self.router, self.epoch_scheduler)
    }
}

fn rng_clone_seed(rng: &mut (impl RngCore + CryptoRng)) -> rand_chacha::ChaChaRng {
    use rand::SeedableRng;
    rand_chacha::ChaChaRng::from_rng(rng).expect("system RNG is available")
}
