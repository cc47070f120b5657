//! Master-public-key resolution from `getPubkey` responses.
//!
//! Accepting any non-empty subset of operator responses without version
//! agreement is simple but unsafe against a minority of stale or malicious
//! operators. This module defaults to requiring majority agreement on
//! `(version, commitments)` and exposes the looser policy only as an
//! explicit opt-in.

use std::collections::HashMap;

use kms_types::{Epoch, PubKeyResponse};

use crate::error::ClientError;

/// How to resolve disagreement across operator `getPubkey` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgreementPolicy {
    /// Require a strict majority of responses to agree on `(version,
    /// commitments)`; otherwise fail closed. The default, and the
    /// recommended policy per §9.
    MajorityAgreement,
    /// Accept the first non-empty response with no cross-checking. Matches
    /// the source's historical behavior; callers opting into this accept
    /// the availability-over-consistency tradeoff explicitly.
    AnyNonEmpty,
}

fn commitment_key(epoch: Epoch, response: &PubKeyResponse) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + response.commitments.len() * 96);
    key.extend_from_slice(&epoch.0.to_be_bytes());
    for c in &response.commitments {
        key.extend_from_slice(&c.to_compressed());
    }
    key
}

/// Resolves a master public key (the constant term of the commitment
/// vector) from a set of `getPubkey` responses, per `policy`.
pub fn resolve(
    responses: &[PubKeyResponse],
    policy: AgreementPolicy,
) -> Result<&PubKeyResponse, ClientError> {
    let active: Vec<&PubKeyResponse> = responses.iter().filter(|r| r.is_active).collect();
    if active.is_empty() {
        return Err(ClientError::Unauthorized);
    }
    match policy {
        AgreementPolicy::AnyNonEmpty => Ok(active[0]),
        AgreementPolicy::MajorityAgreement => {
            let mut groups: HashMap<Vec<u8>, Vec<&PubKeyResponse>> = HashMap::new();
            for r in &active {
                groups
                    .entry(commitment_key(r.version, r))
                    .or_default()
                    .push(r);
            }
            let majority_threshold = active.len() / 2 + 1;
            groups
                .into_values()
                .find(|g| g.len() >= majority_threshold)
                .map(|g| g[0])
                .ok_or(ClientError::Unauthorized)
        }
    }
}
