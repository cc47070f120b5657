//! Node configuration, loaded from CLI flags / environment variables.
//!
//! A `clap::Parser` struct with `env` fallbacks, `humantime`-parsed
//! `Duration`s, and `secrecy::SecretString` for anything that must not leak
//! into logs or `Debug` output.

use std::time::Duration;

use secrecy::SecretString;

/// Deployment environment. Non-production modes relax some checks (e.g. the
/// `ecdsa` dev-mode attestation method and RSA key-length enforcement, §8
/// Property Law 11) that MUST hold in `Prod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Environment {
    /// Production: all defensive checks enforced at full strength.
    Prod,
    /// Development: dev-mode attestation and relaxed key-length checks are
    /// permitted.
    Dev,
}

impl Environment {
    /// Panics if this is not [`Environment::Dev`]. Used to gate
    /// dev-only code paths (e.g. the `ecdsa` attestation method) at the call
    /// site rather than silently degrading in production.
    pub fn assert_is_dev(&self) {
        assert_eq!(*self, Environment::Dev, "this code path is dev-only");
    }
}

/// Top-level node configuration (§6, §7 RSA strength, §4.7 epoch schedule).
#[derive(clap::Parser, Debug)]
#[command(author, version, about)]
pub struct KmsNodeConfig {
    /// Deployment environment.
    #[clap(long, env = "KMS_ENVIRONMENT", default_value = "prod")]
    pub environment: Environment,

    /// This node's on-chain operator address.
    #[clap(long, env = "KMS_OPERATOR_ADDRESS")]
    pub operator_address: alloy::primitives::Address,

    /// Socket address the HTTP API binds to.
    #[clap(long, env = "KMS_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: std::net::SocketAddr,

    /// Wall-clock interval between reshare epochs (§4.7).
    #[clap(long, env = "KMS_RESHARE_INTERVAL", value_parser = humantime::parse_duration, default_value = "24h")]
    pub reshare_interval: Duration,

    /// Per-epoch wall-clock budget before the engine returns `Timeout`
    /// (§5).
    #[clap(long, env = "KMS_EPOCH_TIMEOUT", value_parser = humantime::parse_duration, default_value = "5m")]
    pub epoch_timeout: Duration,

    /// Bounded window within which a dealer collects acknowledgements
    /// (§4.6).
    #[clap(long, env = "KMS_ACK_WINDOW", value_parser = humantime::parse_duration, default_value = "30s")]
    pub ack_window: Duration,

    /// RPC URL of the chain providing the operator directory and block
    /// source. Secret because it commonly embeds an API key.
    #[clap(long, env = "KMS_CHAIN_RPC_URL")]
    pub chain_rpc_url: SecretString,

    /// Minimum RSA key length, in bits, accepted for `secrets` envelope
    /// encryption. MUST be `>= 2048` when `environment = prod` (Property
    /// Law 11).
    #[clap(long, env = "KMS_MIN_RSA_BITS", default_value_t = 2048)]
    pub min_rsa_bits: usize,

    /// Optional Postgres connection string for the secret-manager backend;
    /// falls back to the in-memory backend when unset.
    #[clap(long, env = "KMS_DATABASE_URL")]
    pub database_url: Option<SecretString>,
}

impl KmsNodeConfig {
    /// Validates cross-field invariants this type cannot express through
    /// `clap` attributes alone.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.environment == Environment::Prod && self.min_rsa_bits < 2048 {
            eyre::bail!("production deployments must not lower min_rsa_bits below 2048");
        }
        Ok(())
    }
}
