//! An in-process multi-node harness: spawns a committee of
//! [`kms_node::KmsNodeBuilder`] instances wired together over a
//! [`MemoryNetwork`] and a shared [`BlockEventPump`], exercising DKG and
//! Reshare end to end without a real chain or transport.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use axum_test::TestServer;
use kms_node::config::{Environment, KmsNodeConfig};
use kms_node::services::attestation::InMemoryAttestationRegistry;
use kms_node::services::defaults::DevAttestationVerifier;
use kms_node::services::key_share_store::KeyShareStore;
use kms_node::services::secret_manager::InMemorySecretManager;
use kms_node::{KmsNodeBuilder, NodeCollaborators};
use kms_types::{derive_node_id, NodeId, OperatorDirectoryEntry};
use rand::{CryptoRng, RngCore};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use crate::fakes::{BlockEventPump, MemoryNetwork, RecordingMerkleRootSink, StaticOperatorDirectory, StaticReleaseRegistry};

/// One running node in a [`Committee`].
pub struct TestNode {
    pub node_id: NodeId,
    pub operator_address: Address,
    pub server: TestServer,
    pub key_share_store: KeyShareStore,
    pub merkle_root_sink: Arc<RecordingMerkleRootSink>,
    epoch_scheduler: tokio::task::JoinHandle<eyre::Result<()>>,
    cancellation_token: CancellationToken,
}

impl TestNode {
    /// Cancels the node's epoch scheduler and waits for it to exit.
    pub async fn shutdown(self) -> eyre::Result<()> {
        self.cancellation_token.cancel();
        self.epoch_scheduler.await?
    }
}

/// A committee of nodes sharing one operator set and one in-memory network.
pub struct Committee {
    pub nodes: Vec<TestNode>,
    block_pump: BlockEventPump,
}

impl Committee {
    /// Spawns `size` nodes, each with a distinct derived identity, wired
    /// together over a [`MemoryNetwork`] and a single [`BlockEventPump`].
    pub async fn spawn(
        size: usize,
        reshare_interval: Duration,
        epoch_timeout: Duration,
        ack_window: Duration,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> eyre::Result<Self> {
        let addresses: Vec<Address> = (1..=size as u8).map(Address::repeat_byte).collect();
        let node_ids: Vec<NodeId> = addresses.iter().copied().map(derive_node_id).collect();
        let entries: Vec<OperatorDirectoryEntry> = addresses
            .iter()
            .enumerate()
            .map(|(i, &operator_address)| OperatorDirectoryEntry {
                operator_address,
                socket_address: format!("127.0.0.1:{}", 9000 + i),
                public_key: Vec::new(),
            })
            .collect();

        let network = MemoryNetwork::new(&node_ids);
        let mut block_pump = BlockEventPump::new();

        let mut nodes = Vec::with_capacity(size);
        for (i, &operator_address) in addresses.iter().enumerate() {
            let config = KmsNodeConfig {
                environment: Environment::Dev,
                operator_address,
                bind_addr: SocketAddr::from(([127, 0, 0, 1], 9000 + i as u16)),
                reshare_interval,
                epoch_timeout,
                ack_window,
                chain_rpc_url: SecretString::from("ws://unused.invalid".to_string()),
                min_rsa_bits: 2048,
                database_url: None,
            };

            let mut attestation_registry = InMemoryAttestationRegistry::new();
            attestation_registry.register("ecdsa", Box::new(DevAttestationVerifier));

            let merkle_root_sink = Arc::new(RecordingMerkleRootSink::new());
            let cancellation_token = CancellationToken::new();
            let node_id = node_ids[i];

            let collaborators = NodeCollaborators {
                operator_directory: Arc::new(StaticOperatorDirectory::new(0, entries.clone())),
                release_registry: Arc::new(StaticReleaseRegistry::empty()),
                attestation_registry: Arc::new(attestation_registry),
                merkle_root_sink: merkle_root_sink.clone(),
                block_source: Box::new(block_pump.subscribe()),
                peer_transport: Arc::new(network.transport(node_id)),
                secret_manager: Arc::new(InMemorySecretManager::new()),
            };

            let builder = KmsNodeBuilder::init(
                config,
                0,
                collaborators,
                cancellation_token.clone(),
                rng,
            )
            .await?;
            let key_share_store = builder.key_share_store();
            let (router, epoch_scheduler) = builder.build();
            let server = TestServer::new(router)?;
            nodes.push(TestNode {
                node_id,
                operator_address,
                server,
                key_share_store,
                merkle_root_sink,
                epoch_scheduler,
                cancellation_token,
            });
        }

        Ok(Self { nodes, block_pump })
    }

    /// Broadcasts one synthetic block to every node's `BlockSource`.
    pub fn advance_to(&mut self, timestamp: u64) {
        self.block_pump.advance_to(timestamp);
    }

    /// Shuts every node down and awaits their scheduler tasks.
    pub async fn shutdown(self) -> eyre::Result<()> {
        for node in self.nodes {
            node.shutdown().await?;
        }
        Ok(())
    }
}
