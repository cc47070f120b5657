//! Node binary entry point.
//!
//! Installs the `rustls` crypto provider, initializes tracing, parses
//! configuration, wires collaborator implementations, and serves the HTTP
//! API until a shutdown signal, via a graceful-shutdown future tied to a
//! `CancellationToken`.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use eyre::Context as _;
use kms_node::config::KmsNodeConfig;
use kms_node::services::defaults::{
    DevAttestationVerifier, EmptyReleaseRegistry, LoggingMerkleRootSink, NoPeersTransport,
    SingleOperatorDirectory, WallClockBlockSource,
};
use kms_node::services::secret_manager::InMemorySecretManager;
use kms_node::{KmsNodeBuilder, NodeCollaborators};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("no rustls crypto provider installed yet");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = KmsNodeConfig::parse();
    tracing::info!(?config, "starting kms-node");

    let secret_manager: Arc<dyn kms_node::services::secret_manager::SecretManager> =
        match &config.database_url {
            #[cfg(feature = "postgres")]
            Some(database_url) => Arc::new(
                kms_node::services::secret_manager::postgres::PostgresSecretManager::connect(
                    database_url,
                )
                .await
                .context("while connecting secret-manager to postgres")?,
            ),
            #[cfg(not(feature = "postgres"))]
            Some(_) => eyre::bail!("database_url set but this binary was built without the `postgres` feature"),
            None => Arc::new(InMemorySecretManager::new()),
        };

    let mut attestation_registry =
        kms_node::services::attestation::InMemoryAttestationRegistry::new();
    if config.environment == kms_node::config::Environment::Dev {
        attestation_registry.register("ecdsa", Box::new(DevAttestationVerifier));
    }

    // No chain indexer or peer transport is wired up here: this binary ships
    // with a single-node committee of itself, suitable for local
    // development. Production deployments implement `kms_types::collaborators`
    // against a real chain indexer and peer transport and swap these out.
    let bind_addr = config.bind_addr;
    let collaborators = NodeCollaborators {
        operator_directory: Arc::new(SingleOperatorDirectory::new(
            config.operator_address,
            bind_addr.to_string(),
        )),
        release_registry: Arc::new(EmptyReleaseRegistry),
        attestation_registry: Arc::new(attestation_registry),
        merkle_root_sink: Arc::new(LoggingMerkleRootSink),
        block_source: Box::new(WallClockBlockSource::new(config.reshare_interval)),
        peer_transport: Arc::new(NoPeersTransport),
        secret_manager,
    };

    let cancellation_token = CancellationToken::new();
    let mut rng = rand::rngs::OsRng;
    let (router, epoch_scheduler) = KmsNodeBuilder::init(
        config,
        0,
        collaborators,
        cancellation_token.clone(),
        &mut rng,
    )
    .await
    .context("while initializing kms-node")?
    .build();

    let tcp_listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .context("while binding tcp listener")?;

    let server_cancel = cancellation_token.clone();
    let server = tokio::spawn(async move {
        tracing::info!(%bind_addr, "serving kms-node HTTP API");
        let shutdown = server_cancel.clone();
        if let Err(err) = axum::serve(tcp_listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
        {
            tracing::error!(error = ?err, "axum server exited with an error");
        }
        server_cancel.cancel();
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
            cancellation_token.cancel();
        }
        _ = cancellation_token.cancelled() => {}
    }

    let _ = tokio::join!(server, epoch_scheduler);
    Ok(ExitCode::SUCCESS)
}
