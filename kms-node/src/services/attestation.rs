//! Attestation verifier registry, keyed by method name. Production
//! deployments register `"gcp"` and `"intel"` verifiers; `"ecdsa"` is a
//! dev-only stand-in gated by
//! [`Environment::assert_is_dev`](crate::config::Environment::assert_is_dev).

use std::collections::HashMap;

use kms_types::collaborators::{AttestationVerifier, AttestationVerifierRegistry};

/// A `HashMap`-backed registry mapping attestation method names to their
/// verifiers.
#[derive(Default)]
pub struct InMemoryAttestationRegistry {
    verifiers: HashMap<String, Box<dyn AttestationVerifier>>,
}

impl InMemoryAttestationRegistry {
    /// An empty registry; no method is enabled until [`Self::register`] is
    /// called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `method` (`"gcp"`, `"intel"`, `"ecdsa"`), backed by
    /// `verifier`.
    pub fn register(&mut self, method: impl Into<String>, verifier: Box<dyn AttestationVerifier>) {
        self.verifiers.insert(method.into(), verifier);
    }
}

impl AttestationVerifierRegistry for InMemoryAttestationRegistry {
    fn verifier(&self, method: &str) -> Option<&dyn AttestationVerifier> {
        self.verifiers.get(method).map(|v| v.as_ref())
    }
}
