//! Persistence for the active key-share version: in-memory and Postgres
//! variants behind one pluggable async trait.

use async_trait::async_trait;
use kms_types::KeyShareVersion;

/// A pluggable backend for persisting and recovering the active key-share
/// version across restarts.
#[async_trait]
pub trait SecretManager: Send + Sync {
    /// Loads the most recently persisted active version, if any.
    async fn load_active(&self) -> eyre::Result<Option<KeyShareVersion>>;

    /// Persists `version` as the new active version.
    async fn persist(&self, version: &KeyShareVersion) -> eyre::Result<()>;
}

/// An in-memory backend. Loses all state on restart; suitable for tests and
/// single-process development deployments.
#[derive(Default)]
pub struct InMemorySecretManager {
    inner: parking_lot::RwLock<Option<KeyShareVersion>>,
}

impl InMemorySecretManager {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretManager for InMemorySecretManager {
    async fn load_active(&self) -> eyre::Result<Option<KeyShareVersion>> {
        Ok(self.inner.read().clone())
    }

    async fn persist(&self, version: &KeyShareVersion) -> eyre::Result<()> {
        *self.inner.write() = Some(version.clone());
        Ok(())
    }
}

/// Postgres-backed secret manager, enabled by the `postgres` feature.
#[cfg(feature = "postgres")]
pub mod postgres {
    use super::*;
    use eyre::Context as _;
    use secrecy::ExposeSecret as _;

    /// Persists the active key-share version in a single-row Postgres
    /// table, CBOR-encoded.
    pub struct PostgresSecretManager {
        pool: sqlx::PgPool,
    }

    impl PostgresSecretManager {
        /// Connects to `database_url` and ensures the backing table exists.
        pub async fn connect(database_url: &secrecy::SecretString) -> eyre::Result<Self> {
            let pool = sqlx::PgPool::connect(database_url.expose_secret())
                .await
                .context("while connecting to postgres")?;
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS kms_active_key_share (
                    id BOOLEAN PRIMARY KEY DEFAULT TRUE CHECK (id),
                    epoch BIGINT NOT NULL,
                    payload BYTEA NOT NULL
                )",
            )
            .execute(&pool)
            .await
            .context("while creating kms_active_key_share table")?;
            Ok(Self { pool })
        }
    }

    #[async_trait]
    impl SecretManager for PostgresSecretManager {
        async fn load_active(&self) -> eyre::Result<Option<KeyShareVersion>> {
            let row: Option<(Vec<u8>,)> =
                sqlx::query_as("SELECT payload FROM kms_active_key_share WHERE id = TRUE")
                    .fetch_optional(&self.pool)
                    .await
                    .context("while loading active key-share version")?;
            row.map(|(bytes,)| {
                ciborium::from_reader(bytes.as_slice())
                    .context("while decoding persisted key-share version")
            })
            .transpose()
        }

        async fn persist(&self, version: &KeyShareVersion) -> eyre::Result<()> {
            let mut bytes = Vec::new();
            ciborium::into_writer(version, &mut bytes)
                .context("while encoding key-share version")?;
            sqlx::query(
                "INSERT INTO kms_active_key_share (id, epoch, payload) VALUES (TRUE, $1, $2)
                 ON CONFLICT (id) DO UPDATE SET epoch = EXCLUDED.epoch, payload = EXCLUDED.payload",
            )
            .bind(version.version.0 as i64)
            .bind(bytes)
            .execute(&self.pool)
            .await
            .context("while persisting key-share version")?;
            Ok(())
        }
    }
}
