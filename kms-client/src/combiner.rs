//! Threshold partial-signature combiner, client side.
//!
//! When more than `t` partial signatures are available, the extra ones are
//! sorted and truncated to the first `t` by `nodeID`. That's only safe if
//! every partial is cryptographically verified before inclusion, so this
//! implementation verifies each partial against the active aggregate
//! commitment before it is ever added to the combiner, via the pairing
//! equation:
//! `pair(σ_j, G2_generator) = pair(hashToG1(appID), commitments_aggregated_at_j)`.

use kms_core::shamir::lagrange_coefficients;
use kms_core::{pair, G1, G2};
use kms_protocol::dkg::evaluate_commitment_at;
use kms_types::NodeId;

use crate::error::ClientError;

/// One operator's partial signature response to an `app/sign` request
/// (§4.7).
#[derive(Debug, Clone, Copy)]
pub struct PartialSignature {
    /// The responding operator's node ID, derived by the caller from the
    /// *queried* operator address — never trusted from the response body
    /// (§7 security note).
    pub node_id: NodeId,
    /// `σ_j = x_j · hashToG1(appID)`.
    pub sigma: G1,
}

/// Verifies one partial signature against the active aggregate commitment
/// vector.
pub fn verify_partial(
    app_id: &[u8],
    partial: &PartialSignature,
    aggregate_commitments: &[G2],
) -> bool {
    let q_id = G1::hash_to_curve(app_id);
    let lhs = pair(&partial.sigma, &G2::generator());
    let commitment_at_j = evaluate_commitment_at(aggregate_commitments, partial.node_id);
    let rhs = pair(&q_id, &commitment_at_j);
    lhs == rhs
}

/// Combines verified partial signatures into the application private key
/// `sk_ID = Σ λ_j(S) · σ_j`.
///
/// Every supplied partial is first verified against `aggregate_commitments`
/// and unverifiable ones are dropped (Property Law, §7). The remaining
/// partials are sorted by `nodeID` and the first `threshold` entries are
/// selected, guaranteeing a deterministic subset across independent callers
/// (§4.7). Returns `InsufficientPartials` if fewer than `threshold` partials
/// verify (Scenario S6).
pub fn combine(
    app_id: &[u8],
    partials: &[PartialSignature],
    aggregate_commitments: &[G2],
    threshold: u32,
) -> Result<G1, ClientError> {
    let mut verified: Vec<&PartialSignature> = partials
        .iter()
        .filter(|p| verify_partial(app_id, p, aggregate_commitments))
        .collect();
    verified.sort_by_key(|p| p.node_id);
    verified.dedup_by_key(|p| p.node_id);

    if (verified.len() as u32) < threshold {
        return Err(ClientError::InsufficientPartials {
            needed: threshold,
            have: verified.len() as u32,
        });
    }
    let selected = &verified[..threshold as usize];

    let ids: Vec<u64> = selected.iter().map(|p| p.node_id.as_u64()).collect();
    let lambdas = lagrange_coefficients(&ids)?;

    let mut sk_id = G1::identity();
    for p in selected {
        let lambda = lambdas[&p.node_id.as_u64()];
        sk_id = sk_id.add(&p.sigma.scalar_mul(&lambda));
    }
    Ok(sk_id)
}

/// Computes `hashToG1(appID)`, exposed for callers constructing a
/// `PartialSignature` test fixture or debugging a verification failure.
pub fn identity_point(app_id: &[u8]) -> G1 {
    G1::hash_to_curve(app_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kms_protocol::dkg::DealtShares;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;
    use std::collections::BTreeMap;

    fn rng() -> ChaChaRng {
        ChaChaRng::seed_from_u64(5)
    }

    fn setup() -> (Vec<NodeId>, u32, kms_core::Fr, Vec<G2>, std::collections::BTreeMap<NodeId, kms_core::Fr>) {
        let mut r = rng();
        let directory: Vec<NodeId> = [1, 2, 3, 4, 5].into_iter().map(NodeId).collect();
        let threshold = kms_core::threshold(5);
        let mut dealt = BTreeMap::new();
        for &d in &directory {
            dealt.insert(d, DealtShares::deal(&directory, threshold, &mut r));
        }
        let mut per_dealer = BTreeMap::new();
        for (d, shares) in dealt {
            per_dealer.insert(d, shares.into_parts());
        }
        let mut shares: std::collections::BTreeMap<NodeId, kms_core::Fr> = BTreeMap::new();
        let mut commitments = None;
        for &j in &directory {
            let mut accepted = BTreeMap::new();
            for (&d, (c, per_recipient)) in &per_dealer {
                accepted.insert(d, (per_recipient[&j], c.clone()));
            }
            let (x_j, agg) = kms_protocol::dkg::finalize(&accepted, threshold).unwrap();
            shares.insert(j, x_j);
            commitments = Some(agg);
        }
        (directory, threshold, kms_core::Fr::zero(), commitments.unwrap(), shares)
    }

    #[test]
    fn combiner_matches_ibe_private_key_scenario_s2() {
        let (_, threshold, _, commitments, shares) = setup();
        let app_id = b"test-app-123";
        let q_id = identity_point(app_id);

        let partials: Vec<PartialSignature> = shares
            .iter()
            .map(|(&id, x)| PartialSignature {
                node_id: id,
                sigma: q_id.scalar_mul(x),
            })
            .collect();

        let subset_a: Vec<PartialSignature> = partials
            .iter()
            .filter(|p| p.node_id.as_u64() <= 4)
            .copied()
            .collect();
        let sk_a = combine(app_id, &subset_a, &commitments, threshold).unwrap();

        let subset_b: Vec<PartialSignature> = partials
            .iter()
            .filter(|p| p.node_id.as_u64() >= 2)
            .copied()
            .collect();
        let sk_b = combine(app_id, &subset_b, &commitments, threshold).unwrap();

        assert!(sk_a == sk_b);
    }

    #[test]
    fn threshold_shortfall_scenario_s6() {
        let (_, threshold, _, commitments, shares) = setup();
        let app_id = b"test-app-123";
        let q_id = identity_point(app_id);
        let partials: Vec<PartialSignature> = shares
            .iter()
            .take(threshold as usize - 1)
            .map(|(&id, x)| PartialSignature {
                node_id: id,
                sigma: q_id.scalar_mul(x),
            })
            .collect();
        let result = combine(app_id, &partials, &commitments, threshold);
        assert_eq!(
            result,
            Err(ClientError::InsufficientPartials {
                needed: threshold,
                have: threshold - 1,
            })
        );
    }

    #[test]
    fn forged_partial_is_rejected_before_combination() {
        let (_, threshold, _, commitments, shares) = setup();
        let app_id = b"test-app-123";
        let q_id = identity_point(app_id);
        let mut partials: Vec<PartialSignature> = shares
            .iter()
            .map(|(&id, x)| PartialSignature {
                node_id: id,
                sigma: q_id.scalar_mul(x),
            })
            .collect();
        // corrupt one partial
        partials[0].sigma = partials[0].sigma.add(&q_id);
        let result = combine(app_id, &partials, &commitments, threshold);
        // 4 honest partials remain, still enough to reach threshold
        assert!(result.is_ok());
    }
}
