//! Distributed Key Generation engine.
//!
//! Each participant samples a random secret-sharing polynomial, publishes
//! Pedersen/Feldman commitments to its coefficients, and deals shares to
//! its peers. Peers verify each received share against the dealer's
//! commitments before accepting it. Once every participant's deal has been
//! verified, shares are combined into this node's share of the joint
//! secret and the resulting public commitments are combined into the
//! group's master public key.

use std::collections::BTreeMap;

use kms_core::shamir::Polynomial;
use kms_core::{CoreError, Fr, G2};
use kms_types::{Epoch, NodeId};
use rand::{CryptoRng, RngCore};

/// Per-dealer state within one DKG epoch (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealerState {
    /// No contribution dealt yet.
    Init,
    /// Shares and commitments have been dealt to recipients.
    Dealt,
    /// A quorum of recipients has acknowledged the dealer's share.
    Acknowledged,
    /// The recipient's local aggregate key share has been committed.
    Finalized,
    /// This dealer's epoch record is closed out.
    Retired,
    /// The epoch aborted before a quorum of valid dealers was reached.
    Aborted,
}

/// A dealer's Phase 1 output. Holds the toxic-waste polynomial until it is
/// consumed by [`DealtShares::into_parts`], which MUST happen no later than
/// Phase 3 completion (§4.4).
pub struct DealtShares {
    polynomial: Polynomial,
    /// Commitments `C_d = [a_k · G2]_{k=0..t-1}` published to every
    /// recipient.
    pub commitments: Vec<G2>,
    /// Per-recipient shares `s_{d→j} = f_d(j)`.
    pub shares: BTreeMap<NodeId, Fr>,
}

impl DealtShares {
    /// Phase 1: samples `a_0..a_{t-1}` uniformly, evaluates `f_d` at every
    /// recipient in `directory`, and publishes `C_d`.
    pub fn deal(
        directory: &[NodeId],
        threshold: u32,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Self {
        debug_assert!(threshold >= 1);
        let polynomial = Polynomial::sample(threshold as usize - 1, rng);
        let commitments = polynomial
            .coeffs()
            .iter()
            .map(|a| G2::generator().scalar_mul(a))
            .collect();
        let shares = directory
            .iter()
            .map(|&j| (j, polynomial.eval_at(j.as_u64())))
            .collect();
        DealtShares {
            polynomial,
            commitments,
            shares,
        }
    }

    /// This dealer's contribution to the master secret, `a_0`.
    pub fn secret_contribution(&self) -> Fr {
        self.polynomial.constant_term()
    }

    /// Consumes the toxic-waste polynomial, returning only the public
    /// commitments and per-recipient shares.
    pub fn into_parts(self) -> (Vec<G2>, BTreeMap<NodeId, Fr>) {
        (self.commitments, self.shares)
    }
}

/// Homomorphically evaluates a commitment vector at `id`: `Σ_k id^k · C[k]`.
/// This is a commitment to `f(id)` without revealing `f`, and is the basis
/// of both Feldman verification ([`verify_share`]) and the Reshare engine's
/// dealer-equivocation check.
pub fn evaluate_commitment_at(commitments: &[G2], id: NodeId) -> G2 {
    let x = Fr::from_u64(id.as_u64());
    let mut acc = G2::identity();
    let mut power = Fr::one();
    for c_k in commitments {
        acc = acc.add(&c_k.scalar_mul(&power));
        power = power.mul(&x);
    }
    acc
}

/// Phase 2: verifies a received share against the dealer's commitment
/// vector. `s·G2_generator = Σ_{k=0}^{t-1} (j^k)·C_d[k]`.
///
/// Rejects on inequality or on an empty commitment vector; decompression
/// failures are rejected upstream by `G2::from_compressed`.
pub fn verify_share(recipient: NodeId, share: &Fr, commitments: &[G2]) -> Result<(), CoreError> {
    if commitments.is_empty() {
        return Err(CoreError::InvalidShare);
    }
    let lhs = G2::generator().scalar_mul(share);
    let rhs = evaluate_commitment_at(commitments, recipient);
    if lhs == rhs {
        Ok(())
    } else {
        Err(CoreError::InvalidShare)
    }
}

/// Phase 3: finalizes a recipient's view given the set of dealers whose
/// shares it accepted. Returns the aggregate private share and the
/// elementwise-summed commitment vector.
///
/// `D` (the set of accepted dealers) is implicit in `accepted`'s key set;
/// callers MUST have already confirmed `|D| ≥ t` (`InsufficientDealers`
/// otherwise, per §4.4's failure semantics) before calling this.
pub fn finalize(
    accepted: &BTreeMap<NodeId, (Fr, Vec<G2>)>,
    threshold: u32,
) -> Result<(Fr, Vec<G2>), CoreError> {
    if (accepted.len() as u32) < threshold {
        return Err(CoreError::InsufficientDealers {
            needed: threshold,
            have: accepted.len() as u32,
        });
    }
    let t = threshold as usize;
    let mut aggregate_share = Fr::zero();
    let mut aggregate_commitments = vec![G2::identity(); t];
    for (share, commitments) in accepted.values() {
        if commitments.len() != t {
            return Err(CoreError::InvalidShare);
        }
        aggregate_share = aggregate_share.add(share);
        for (acc, c) in aggregate_commitments.iter_mut().zip(commitments) {
            *acc = acc.add(c);
        }
    }
    Ok((aggregate_share, aggregate_commitments))
}

/// The outcome of a completed DKG epoch for one recipient (§4.4 Phase 3).
pub struct FinalizedKeyShare {
    /// The epoch this result belongs to.
    pub epoch: Epoch,
    /// `x_j = Σ_{d∈D} s_{d→j}`.
    pub private_share: Fr,
    /// `[Σ_{d∈D} C_d[k]]_k`.
    pub commitments: Vec<G2>,
    /// `sorted(D)`.
    pub participant_ids: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    fn rng() -> ChaChaRng {
        ChaChaRng::seed_from_u64(11)
    }

    #[test]
    fn dkg_correctness_scenario_s1_five_dealers_threshold_four() {
        let mut r = rng();
        let directory: Vec<NodeId> = [1, 2, 3, 4, 5].into_iter().map(NodeId).collect();
        let threshold = kms_core::threshold(5);
        assert_eq!(threshold, 4);

        let mut dealt: BTreeMap<NodeId, DealtShares> = BTreeMap::new();
        for &d in &directory {
            dealt.insert(d, DealtShares::deal(&directory, threshold, &mut r));
        }

        let expected_master_secret = dealt
            .values()
            .map(|d| d.secret_contribution())
            .fold(Fr::zero(), |acc, a| acc.add(&a));

        // every recipient verifies every dealer's share and finalizes
        let mut recipient_results: BTreeMap<NodeId, (Fr, Vec<G2>)> = BTreeMap::new();
        let mut per_dealer_parts: BTreeMap<NodeId, (Vec<G2>, BTreeMap<NodeId, Fr>)> =
            BTreeMap::new();
        for (&d, shares) in dealt {
            let (commitments, per_recipient) = shares.into_parts();
            for (&j, s) in &per_recipient {
                verify_share(j, s, &commitments).expect("honest dealer's shares verify");
            }
            per_dealer_parts.insert(d, (commitments, per_recipient));
        }

        for &j in &directory {
            let mut accepted: BTreeMap<NodeId, (Fr, Vec<G2>)> = BTreeMap::new();
            for (&d, (commitments, per_recipient)) in &per_dealer_parts {
                accepted.insert(d, (per_recipient[&j], commitments.clone()));
            }
            let (x_j, agg_commitments) = finalize(&accepted, threshold).unwrap();
            recipient_results.insert(j, (x_j, agg_commitments));
        }

        // master public key agrees across all recipients
        let mpk = recipient_results[&NodeId(1)].1[0].clone();
        for (_, (_, commitments)) in &recipient_results {
            assert!(commitments[0] == mpk);
        }
        assert_eq!(mpk, G2::generator().scalar_mul(&expected_master_secret));

        // any 4-of-5 subset reconstructs the master secret
        let shares: BTreeMap<u64, Fr> = recipient_results
            .iter()
            .take(4)
            .map(|(&id, (x, _))| (id.as_u64(), *x))
            .collect();
        let recovered = kms_core::shamir::recover_secret(&shares).unwrap();
        assert_eq!(recovered, expected_master_secret);
    }

    #[test]
    fn byzantine_dealer_is_dropped_but_epoch_completes_scenario_s4() {
        let mut r = rng();
        let directory: Vec<NodeId> = [1, 2, 3, 4, 5].into_iter().map(NodeId).collect();
        let threshold = kms_core::threshold(5);

        let mut dealt: BTreeMap<NodeId, DealtShares> = BTreeMap::new();
        for &d in &directory {
            dealt.insert(d, DealtShares::deal(&directory, threshold, &mut r));
        }
        let mut per_dealer_parts: BTreeMap<NodeId, (Vec<G2>, BTreeMap<NodeId, Fr>)> =
            BTreeMap::new();
        for (d, shares) in dealt {
            per_dealer_parts.insert(d, shares.into_parts());
        }

        // dealer 2 ships a corrupted share to every recipient
        if let Some((_, per_recipient)) = per_dealer_parts.get_mut(&NodeId(2)) {
            for share in per_recipient.values_mut() {
                *share = share.add(&Fr::one());
            }
        }

        let mut accepted_dealers: Vec<NodeId> = Vec::new();
        for &j in &directory {
            let mut accepted: BTreeMap<NodeId, (Fr, Vec<G2>)> = BTreeMap::new();
            for (&d, (commitments, per_recipient)) in &per_dealer_parts {
                let s = per_recipient[&j];
                if verify_share(j, &s, commitments).is_ok() {
                    accepted.insert(d, (s, commitments.clone()));
                }
            }
            if j == NodeId(1) {
                accepted_dealers = accepted.keys().copied().collect();
            }
            assert!((accepted.len() as u32) >= threshold);
            finalize(&accepted, threshold).unwrap();
        }
        assert!(!accepted_dealers.contains(&NodeId(2)));
        assert_eq!(accepted_dealers.len(), 4);
    }
}
