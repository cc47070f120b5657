//! Diagnostic binary printing the Postgres-persisted active key-share
//! version for a node: its epoch, participant set, and master public key.
//! A read-only inspector run directly against a live deployment's backing
//! store, rather than against the chain.

use clap::Parser;
use eyre::Context as _;
use secrecy::SecretString;

#[derive(Parser, Debug)]
#[command(name = "kms-inspect", about = "Prints the persisted active key-share version")]
struct Args {
    /// Postgres connection string for the secret-manager backend.
    #[arg(long, env = "KMS_DATABASE_URL")]
    database_url: SecretString,
}

#[cfg(feature = "postgres")]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    use kms_node::services::secret_manager::postgres::PostgresSecretManager;
    use kms_node::services::secret_manager::SecretManager as _;

    let args = Args::parse();
    let secret_manager = PostgresSecretManager::connect(&args.database_url)
        .await
        .context("while connecting to postgres")?;

    match secret_manager.load_active().await? {
        Some(version) => print_version(&version),
        None => println!("no active key-share version persisted"),
    }
    Ok(())
}

#[cfg(feature = "postgres")]
fn print_version(version: &kms_types::KeyShareVersion) {
    println!("epoch:          {}", version.version.0);
    println!("is_active:      {}", version.is_active);
    println!("threshold:      {}", version.threshold());
    println!("participants:   {}", version.participant_ids.len());
    for id in &version.participant_ids {
        println!("  - {id}");
    }
    match version.master_public_key() {
        Some(mpk) => println!("master pubkey:  {}", alloy::hex::encode(mpk.to_compressed())),
        None => println!("master pubkey:  (no commitments)"),
    }
}

#[cfg(not(feature = "postgres"))]
fn main() -> eyre::Result<()> {
    eyre::bail!("kms-inspect was built without the `postgres` feature; rebuild with --features postgres")
}
