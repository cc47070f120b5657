//! Proactive / committee-change resharing engine.
//!
//! Reshares an existing secret across a (possibly different) set of
//! participants and a (possibly different) threshold without ever
//! reconstructing the secret itself: each current share-holder splits its
//! own share into sub-shares for the new committee via a fresh
//! zero-constant-term polynomial, new holders sum the sub-shares they
//! receive, and the master public key is invariant across the round.
//! Reuses [`crate::dkg::verify_share`] and
//! [`crate::dkg::evaluate_commitment_at`] for the inner Feldman check.

use std::collections::BTreeMap;

use kms_core::shamir::{lagrange_coefficients, Polynomial};
use kms_core::{CoreError, Fr, G2};
use kms_types::{Epoch, NodeId};
use rand::{CryptoRng, RngCore};

use crate::dkg::{evaluate_commitment_at, verify_share};

/// One old-committee operator's reshare contribution (§4.5). Holds the
/// toxic-waste polynomial `f'_i` until consumed.
pub struct ReshareContribution {
    polynomial: Polynomial,
    /// `C'_i = [x_i·G2, b_{i,1}·G2, …]`.
    pub commitments: Vec<G2>,
    /// `s'_{i→j}` for every `j` in the new committee.
    pub shares: BTreeMap<NodeId, Fr>,
}

impl ReshareContribution {
    /// Dealer `i` treats its current share `old_share` as the secret of a
    /// fresh polynomial of degree `new_threshold - 1` and deals it to the
    /// new committee.
    pub fn deal(
        old_share: Fr,
        new_committee: &[NodeId],
        new_threshold: u32,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Self {
        debug_assert!(new_threshold >= 1);
        let polynomial = Polynomial::with_constant(old_share, new_threshold as usize - 1, rng);
        let commitments = polynomial
            .coeffs()
            .iter()
            .map(|a| G2::generator().scalar_mul(a))
            .collect();
        let shares = new_committee
            .iter()
            .map(|&j| (j, polynomial.eval_at(j.as_u64())))
            .collect();
        ReshareContribution {
            polynomial,
            commitments,
            shares,
        }
    }

    /// Consumes the toxic-waste polynomial, returning the public
    /// commitments and per-recipient shares.
    pub fn into_parts(self) -> (Vec<G2>, BTreeMap<NodeId, Fr>) {
        (self.commitments, self.shares)
    }
}

/// Verifies one reshare contribution `(s'_{i→j}, C'_i)` received by
/// recipient `j` from old-committee dealer `i`.
///
/// Enforces both checks §4.5 requires:
/// 1. The ordinary Feldman equation over `C'_i` (rejects `InvalidShare`).
/// 2. `C'_i[0]` equals the homomorphic evaluation of the *old* committee's
///    aggregate commitment vector at `i` — the dealer's own legitimately
///    published share commitment. A mismatch means dealer `i` is resharing
///    a value other than its real share (`DealerEquivocation`).
pub fn verify_reshare_contribution(
    recipient: NodeId,
    dealer: NodeId,
    share: &Fr,
    new_commitments: &[G2],
    old_aggregate_commitments: &[G2],
) -> Result<(), CoreError> {
    verify_share(recipient, share, new_commitments)?;
    let expected = evaluate_commitment_at(old_aggregate_commitments, dealer);
    if new_commitments[0] == expected {
        Ok(())
    } else {
        Err(CoreError::DealerEquivocation)
    }
}

/// Finalizes a new-committee recipient's share from the set `R` of accepted
/// old-committee dealer contributions.
///
/// `x'_j = Σ_{i∈R} λ_i(R) · s'_{i→j}`; the new aggregate commitment vector
/// is the elementwise Lagrange-weighted sum of the `C'_i`, which by
/// linearity preserves the constant term `mpk` (Property Law 6).
pub fn finalize_reshare(
    accepted: &BTreeMap<NodeId, (Fr, Vec<G2>)>,
    old_threshold: u32,
) -> Result<(Fr, Vec<G2>), CoreError> {
    if (accepted.len() as u32) < old_threshold {
        return Err(CoreError::InsufficientDealers {
            needed: old_threshold,
            have: accepted.len() as u32,
        });
    }
    let r: Vec<u64> = accepted.keys().map(|id| id.as_u64()).collect();
    let lambdas = lagrange_coefficients(&r)?;

    let degree = accepted
        .values()
        .next()
        .map(|(_, c)| c.len())
        .unwrap_or(0);
    let mut new_share = Fr::zero();
    let mut new_commitments = vec![G2::identity(); degree];
    for (i, (s_i, c_i)) in accepted {
        if c_i.len() != degree {
            return Err(CoreError::InvalidShare);
        }
        let lambda = lambdas[&i.as_u64()];
        new_share = new_share.add(&lambda.mul(s_i));
        for (acc, c) in new_commitments.iter_mut().zip(c_i) {
            *acc = acc.add(&c.scalar_mul(&lambda));
        }
    }
    Ok((new_share, new_commitments))
}

/// A completed reshare round's result, pending orchestrator-level
/// activation gated on a quorum of completion signatures (§4.5 point 3).
pub struct ReshareResult {
    /// The new epoch this reshare installs.
    pub epoch: Epoch,
    /// `x'_j`.
    pub private_share: Fr,
    /// The new elementwise-Lagrange-weighted aggregate commitment vector.
    pub commitments: Vec<G2>,
    /// The old-committee dealers `R` whose contributions were accepted.
    pub participant_ids: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dkg::DealtShares;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    fn rng() -> ChaChaRng {
        ChaChaRng::seed_from_u64(99)
    }

    #[test]
    fn reshare_preserves_master_public_key_scenario_s3() {
        let mut r = rng();
        let old_committee: Vec<NodeId> = [1, 2, 3, 4, 5].into_iter().map(NodeId).collect();
        let old_threshold = kms_core::threshold(5);

        // bootstrap an initial DKG so every old-committee member has a real share
        let mut dealt = BTreeMap::new();
        for &d in &old_committee {
            dealt.insert(d, DealtShares::deal(&old_committee, old_threshold, &mut r));
        }
        let mut per_dealer: BTreeMap<NodeId, (Vec<G2>, BTreeMap<NodeId, Fr>)> = BTreeMap::new();
        for (d, shares) in dealt {
            per_dealer.insert(d, shares.into_parts());
        }
        let mut old_shares: BTreeMap<NodeId, Fr> = BTreeMap::new();
        let mut old_commitments: BTreeMap<NodeId, Vec<G2>> = BTreeMap::new();
        for &j in &old_committee {
            let mut accepted = BTreeMap::new();
            for (&d, (c, per_recipient)) in &per_dealer {
                accepted.insert(d, (per_recipient[&j], c.clone()));
            }
            let (x_j, agg) = crate::dkg::finalize(&accepted, old_threshold).unwrap();
            old_shares.insert(j, x_j);
            old_commitments.insert(j, agg);
        }
        let old_mpk = old_commitments[&NodeId(1)][0];

        // committee [1,2,3,4,5] -> [1,2,3,4,6]
        let new_committee: Vec<NodeId> = [1, 2, 3, 4, 6].into_iter().map(NodeId).collect();
        let new_threshold = kms_core::threshold(5);

        let mut contributions: BTreeMap<NodeId, ReshareContribution> = BTreeMap::new();
        for &i in &old_committee {
            contributions.insert(
                i,
                ReshareContribution::deal(old_shares[&i], &new_committee, new_threshold, &mut r),
            );
        }
        let mut per_dealer_reshare: BTreeMap<NodeId, (Vec<G2>, BTreeMap<NodeId, Fr>)> =
            BTreeMap::new();
        for (i, c) in contributions {
            per_dealer_reshare.insert(i, c.into_parts());
        }

        let mut new_shares: BTreeMap<NodeId, Fr> = BTreeMap::new();
        let mut new_mpk = None;
        for &j in &new_committee {
            let mut accepted: BTreeMap<NodeId, (Fr, Vec<G2>)> = BTreeMap::new();
            for (&i, (c_i, per_recipient)) in &per_dealer_reshare {
                let s = per_recipient[&j];
                verify_reshare_contribution(j, i, &s, c_i, &old_commitments[&i])
                    .expect("honest reshare dealer verifies");
                accepted.insert(i, (s, c_i.clone()));
            }
            let (x_j, agg) = finalize_reshare(&accepted, old_threshold).unwrap();
            new_shares.insert(j, x_j);
            if new_mpk.is_none() {
                new_mpk = Some(agg[0]);
            } else {
                assert!(agg[0] == new_mpk.unwrap());
            }
        }
        assert_eq!(new_mpk.unwrap(), old_mpk, "master public key must survive reshare");

        // new committee reconstructs the same master secret
        let subset: BTreeMap<u64, Fr> = new_shares
            .iter()
            .take(new_threshold as usize)
            .map(|(&k, &v)| (k.as_u64(), v))
            .collect();
        let recovered = kms_core::shamir::recover_secret(&subset).unwrap();
        assert_eq!(G2::generator().scalar_mul(&recovered), new_mpk.unwrap());
    }

    #[test]
    fn equivocating_dealer_is_rejected() {
        let mut r = rng();
        let old_committee: Vec<NodeId> = [1, 2, 3].into_iter().map(NodeId).collect();
        let fake_old_commitments = vec![G2::generator().scalar_mul(&Fr::random(&mut r))];
        let contribution = ReshareContribution::deal(Fr::random(&mut r), &old_committee, 2, &mut r);
        let (commitments, shares) = contribution.into_parts();
        let result = verify_reshare_contribution(
            NodeId(1),
            NodeId(1),
            &shares[&NodeId(1)],
            &commitments,
            &fake_old_commitments,
        );
        assert_eq!(result, Err(CoreError::DealerEquivocation));
    }
}
