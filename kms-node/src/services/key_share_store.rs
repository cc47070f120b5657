//! The key-share store: the only shared mutable state in the core.
//!
//! `Arc<RwLock<...>>`-backed, holding a single active slot: exactly one
//! `KeyShareVersion` is active at a time, swapped atomically on install.

use std::sync::Arc;

use kms_types::KeyShareVersion;
use parking_lot::RwLock;

/// Exposes `readActive()` (an immutable snapshot) and `install(newVersion)`
/// (an atomic swap that deactivates any prior version), per §5's shared-
/// resource policy. Readers holding a snapshot are unaffected by a
/// concurrent `install`.
#[derive(Clone, Default)]
pub struct KeyShareStore(Arc<RwLock<Option<KeyShareVersion>>>);

impl KeyShareStore {
    /// Creates an empty store; `read_active()` returns `None` until the
    /// first DKG epoch installs a version.
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(None)))
    }

    /// `readActive()`: an immutable snapshot of the active version, or
    /// `None` before the first epoch completes.
    pub fn read_active(&self) -> Option<KeyShareVersion> {
        self.0.read().clone()
    }

    /// `install(newVersion)`: atomically installs `new_version` as active,
    /// deactivating whatever was active before. This is the last step of
    /// any epoch transition (§5: "installation is the last step").
    pub fn install(&self, mut new_version: KeyShareVersion) {
        new_version.is_active = true;
        {
            let mut guard = self.0.write();
            *guard = Some(new_version);
        }
        metrics::gauge!(crate::metrics::METRICS_ID_KEY_SHARE_ACTIVE).set(1.0);
        if let Some(v) = self.0.read().as_ref() {
            metrics::gauge!(crate::metrics::METRICS_ID_ACTIVE_EPOCH).set(v.version.0 as f64);
        }
    }

    /// Whether any version has ever been installed.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kms_core::{Fr, G2};

    fn fixture(version: u64) -> KeyShareVersion {
        KeyShareVersion {
            version: kms_types::Epoch(version),
            private_share: Fr::zero(),
            commitments: vec![G2::generator()],
            is_active: false,
            participant_ids: vec![],
        }
    }

    #[test]
    fn install_activates_and_replaces_prior_version() {
        let store = KeyShareStore::new();
        assert!(store.is_empty());
        store.install(fixture(0));
        assert_eq!(store.read_active().unwrap().version.0, 0);
        store.install(fixture(1));
        assert_eq!(store.read_active().unwrap().version.0, 1);
        assert!(store.read_active().unwrap().is_active);
    }
}
