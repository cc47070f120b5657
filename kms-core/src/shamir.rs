//! Polynomial evaluation and Lagrange interpolation over `Fr`.
//!
//! Polynomials are represented by their coefficients, lowest degree first.
//! Shares are `(id, evalAt(poly, id))` pairs; reconstruction recombines a
//! threshold-sized set of shares via Lagrange interpolation at zero.

use std::collections::BTreeMap;

use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::curve::Fr;
use crate::error::CoreError;

/// A non-zero, stable operator identifier (§6 `nodeID`). Interpolation runs
/// at these IDs.
pub type NodeId = u64;

/// The only supported threshold rule (Property Law 1): `t(n) = ⌈2n/3⌉`,
/// computed as `(2n+2) div 3`.
pub fn threshold(n: u32) -> u32 {
    (2 * n + 2) / 3
}

/// A Shamir polynomial `f(x) = a0 + a1 x + … + a_{t-1} x^{t-1}` over `Fr`.
///
/// Zeroized on drop. Coefficients are DKG/reshare toxic waste and must not
/// outlive the epoch operation that generated them (§5, §7).
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Polynomial {
    coeffs: Vec<Fr>,
}

impl Polynomial {
    /// Samples a fresh random polynomial of the given degree (DKG Phase 1).
    pub fn sample(degree: usize, rng: &mut (impl RngCore + CryptoRng)) -> Self {
        Polynomial {
            coeffs: (0..=degree).map(|_| Fr::random(rng)).collect(),
        }
    }

    /// Builds a polynomial whose constant term is fixed and whose remaining
    /// coefficients are freshly sampled. Used by the Reshare engine (§4.5),
    /// where the constant term is a dealer's existing share rather than a
    /// fresh random secret.
    pub fn with_constant(
        constant: Fr,
        degree: usize,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Self {
        let mut coeffs = Vec::with_capacity(degree + 1);
        coeffs.push(constant);
        coeffs.extend((0..degree).map(|_| Fr::random(rng)));
        Polynomial { coeffs }
    }

    /// Builds a polynomial directly from coefficients, e.g. for testing.
    pub fn from_coeffs(coeffs: Vec<Fr>) -> Self {
        Polynomial { coeffs }
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn coeffs(&self) -> &[Fr] {
        &self.coeffs
    }

    pub fn constant_term(&self) -> Fr {
        self.coeffs[0]
    }

    /// `evalAt`: Horner evaluation at node ID `x`, interpreted as an `Fr`.
    pub fn eval_at(&self, x: NodeId) -> Fr {
        let x = Fr::from_u64(x);
        let mut acc = Fr::zero();
        for c in self.coeffs.iter().rev() {
            acc = acc.mul(&x).add(c);
        }
        acc
    }
}

/// `lagrangeAtZero`: `λ_i = Π_{j ∈ S, j ≠ i} j / (j − i)` in `Fr`.
///
/// `S` MUST contain `i` and must consist of distinct non-zero IDs.
pub fn lagrange_at_zero(i: NodeId, s: &[NodeId]) -> Result<Fr, CoreError> {
    if i == 0 || !s.contains(&i) {
        return Err(CoreError::InvalidInterpolationSet);
    }
    let i_fr = Fr::from_u64(i);
    let mut num = Fr::one();
    let mut den = Fr::one();
    for &j in s {
        if j == i {
            continue;
        }
        if j == 0 {
            return Err(CoreError::InvalidInterpolationSet);
        }
        let j_fr = Fr::from_u64(j);
        num = num.mul(&j_fr);
        den = den.mul(&j_fr.sub(&i_fr));
    }
    let inv = den.invert().ok_or(CoreError::InvalidInterpolationSet)?;
    Ok(num.mul(&inv))
}

/// Computes every Lagrange-at-zero coefficient for the set `s` at once.
/// Equivalent to calling [`lagrange_at_zero`] once per member of `s`.
pub fn lagrange_coefficients(s: &[NodeId]) -> Result<BTreeMap<NodeId, Fr>, CoreError> {
    let mut out = BTreeMap::new();
    for &i in s {
        out.insert(i, lagrange_at_zero(i, s)?);
    }
    Ok(out)
}

/// `recoverSecret`: `Σ_{i∈S} λ_i · f(i)` over the supplied `(nodeID, share)`
/// pairs. `S` is taken to be exactly the key set of `shares`.
pub fn recover_secret(shares: &BTreeMap<NodeId, Fr>) -> Result<Fr, CoreError> {
    if shares.is_empty() {
        return Err(CoreError::InvalidInterpolationSet);
    }
    let ids: Vec<NodeId> = shares.keys().copied().collect();
    let mut acc = Fr::zero();
    for (&i, share) in shares {
        let lambda = lagrange_at_zero(i, &ids)?;
        acc = acc.add(&lambda.mul(share));
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    fn rng() -> ChaChaRng {
        ChaChaRng::seed_from_u64(42)
    }

    #[test]
    fn threshold_formula_matches_property_law_1() {
        assert_eq!(threshold(1), 1);
        assert_eq!(threshold(4), 3);
        assert_eq!(threshold(5), 4);
        assert_eq!(threshold(7), 5);
        assert_eq!(threshold(100), 67);
    }

    #[test]
    fn lagrange_coefficients_sum_to_one() {
        let s: Vec<NodeId> = vec![1, 2, 3, 4, 5];
        let coeffs = lagrange_coefficients(&s).unwrap();
        let sum = coeffs.values().fold(Fr::zero(), |acc, l| acc.add(l));
        assert_eq!(sum, Fr::one());
    }

    #[test]
    fn polynomial_recovery_from_any_threshold_subset() {
        let mut r = rng();
        let poly = Polynomial::sample(3, &mut r);
        let all_ids: Vec<NodeId> = vec![1, 2, 3, 4, 5];
        for subset in [
            vec![1, 2, 3, 4],
            vec![2, 3, 4, 5],
            vec![1, 3, 4, 5],
            vec![1, 2, 4, 5],
        ] {
            let shares: BTreeMap<NodeId, Fr> =
                subset.iter().map(|&i| (i, poly.eval_at(i))).collect();
            let recovered = recover_secret(&shares).unwrap();
            assert_eq!(recovered, poly.constant_term());
        }
        let _ = all_ids;
    }

    #[test]
    fn recover_secret_rejects_empty_set() {
        let shares: BTreeMap<NodeId, Fr> = BTreeMap::new();
        assert!(recover_secret(&shares).is_err());
    }

    #[test]
    fn lagrange_rejects_zero_id() {
        assert!(lagrange_at_zero(0, &[0, 1, 2]).is_err());
    }
}
