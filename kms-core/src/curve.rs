//! BLS12-381 group arithmetic.
//!
//! Built on `arkworks` (`ark-bls12-381`/`ark-ec`/`ark-ff`) rather than the
//! more commonly reached-for `bls12_381`/`group` pairing: this system's IBE
//! codec (`crate::ibe`) needs to turn a pairing result (an element of the
//! target group `Gt`) into HKDF input key material, and `arkworks` is the
//! BLS12-381 stack in this ecosystem whose target-group type actually
//! implements `CanonicalSerialize` — `bls12_381::Gt` does not expose any
//! byte encoding at all.
//!
//! `Fr` equality is constant-time (`subtle::ConstantTimeEq` over the
//! canonical encoding), since it compares polynomial coefficients and
//! recovered secrets.

use ark_bls12_381::g1::Config as ArkG1Config;
use ark_bls12_381::{
    Bls12_381, Fr as ArkFr, G1Affine as ArkG1Affine, G1Projective as ArkG1Projective,
    G2Affine as ArkG2Affine, G2Projective as ArkG2Projective,
};
use ark_ec::hashing::curve_maps::wb::WBMap;
use ark_ec::hashing::map_to_curve_hasher::MapToCurveBasedHasher;
use ark_ec::hashing::HashToCurve;
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{CurveGroup, Group};
use ark_ff::field_hashers::DefaultFieldHasher;
use ark_ff::{Field, One, UniformRand, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::CoreError;

/// The domain-separation tag for `hashToG1`. Fixed for this system; both
/// peers of every wire exchange MUST use this exact tag.
pub const HASH_TO_G1_DST: &[u8] = b"KMS-V1-BLS12381G1_XMD:SHA-256_SSWU_RO_";

type G1Hasher = MapToCurveBasedHasher<ArkG1Projective, DefaultFieldHasher<sha2::Sha256>, WBMap<ArkG1Config>>;

/// An element of the BLS12-381 scalar field `Fr`.
///
/// Zeroized on drop: every `Fr` in this crate is potentially a share,
/// polynomial coefficient, or recovered secret.
#[derive(Clone, Copy)]
pub struct Fr(pub(crate) ArkFr);

impl Fr {
    /// Samples a uniformly random scalar.
    pub fn random(rng: &mut (impl RngCore + rand::CryptoRng)) -> Self {
        Fr(ArkFr::rand(rng))
    }

    /// The additive identity.
    pub fn zero() -> Self {
        Fr(ArkFr::zero())
    }

    /// The multiplicative identity.
    pub fn one() -> Self {
        Fr(ArkFr::one())
    }

    /// Builds a scalar from a small unsigned integer, e.g. a node ID used as
    /// an evaluation point.
    pub fn from_u64(x: u64) -> Self {
        Fr(ArkFr::from(x))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: &Fr) -> Fr {
        Fr(self.0 + other.0)
    }

    pub fn sub(&self, other: &Fr) -> Fr {
        Fr(self.0 - other.0)
    }

    pub fn mul(&self, other: &Fr) -> Fr {
        Fr(self.0 * other.0)
    }

    pub fn neg(&self) -> Fr {
        Fr(-self.0)
    }

    /// Multiplicative inverse. `None` iff `self` is zero.
    pub fn invert(&self) -> Option<Fr> {
        self.0.inverse().map(Fr)
    }

    /// Fixed-width 32-byte canonical encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut buf = [0u8; 32];
        self.0
            .serialize_compressed(&mut buf[..])
            .expect("Fr's canonical encoding is exactly 32 bytes");
        buf
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Fr, CoreError> {
        ArkFr::deserialize_compressed(&bytes[..])
            .map(Fr)
            .map_err(|_| CoreError::InvalidEncoding)
    }
}

/// Constant-time: `Fr` carries polynomial coefficients and recovered
/// secrets, so comparisons must not branch on the value being compared.
impl PartialEq for Fr {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes().ct_eq(&other.to_bytes()).into()
    }
}
impl Eq for Fr {}

impl Zeroize for Fr {
    fn zeroize(&mut self) {
        self.0 = ArkFr::zero();
    }
}

impl Serialize for Fr {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        serde_bytes::serialize(&self.to_bytes()[..], s)
    }
}

impl<'de> Deserialize<'de> for Fr {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = serde_bytes::deserialize(d)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("Fr must be 32 bytes"))?;
        Fr::from_bytes(&arr).map_err(|_| serde::de::Error::custom("invalid Fr encoding"))
    }
}

/// A point in the BLS12-381 `G1` prime-order subgroup.
///
/// `G1` carries partial signatures and application private keys.
#[derive(Clone, Copy, Debug)]
pub struct G1(pub(crate) ArkG1Projective);

impl G1 {
    pub fn generator() -> Self {
        G1(ArkG1Projective::generator())
    }

    pub fn identity() -> Self {
        G1(ArkG1Projective::zero())
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: &G1) -> G1 {
        G1(self.0 + other.0)
    }

    pub fn scalar_mul(&self, s: &Fr) -> G1 {
        G1(self.0 * s.0)
    }

    /// Canonical 48-byte compressed encoding.
    pub fn to_compressed(&self) -> [u8; 48] {
        let mut buf = [0u8; 48];
        self.0
            .into_affine()
            .serialize_compressed(&mut buf[..])
            .expect("G1's canonical encoding is exactly 48 bytes");
        buf
    }

    /// Decompresses, rejecting non-canonical encodings, off-curve points, and
    /// points outside the prime-order subgroup.
    pub fn from_compressed(bytes: &[u8; 48]) -> Result<Self, CoreError> {
        ArkG1Affine::deserialize_compressed(&bytes[..])
            .map(|a| G1(a.into()))
            .map_err(|_| CoreError::NotInSubgroup)
    }

    /// Hashes an arbitrary byte string into `G1` using the fixed system DST
    /// (§6). Used both for identity hashing in IBE and for node-ID-agnostic
    /// share/partial-signature derivation.
    pub fn hash_to_curve(message: &[u8]) -> Self {
        let hasher = G1Hasher::new(HASH_TO_G1_DST).expect("static DST is valid for this hasher");
        let point = hasher
            .hash(message)
            .expect("hash-to-curve succeeds for any input length");
        G1(point.into())
    }
}

impl PartialEq for G1 {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for G1 {}

impl Serialize for G1 {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        serde_bytes::serialize(&self.to_compressed()[..], s)
    }
}

impl<'de> Deserialize<'de> for G1 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = serde_bytes::deserialize(d)?;
        let arr: [u8; 48] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("G1 must be 48 bytes"))?;
        G1::from_compressed(&arr).map_err(|_| serde::de::Error::custom("invalid G1 encoding"))
    }
}

/// A point in the BLS12-381 `G2` prime-order subgroup.
///
/// `G2` carries polynomial commitments and the master public key.
#[derive(Clone, Copy, Debug)]
pub struct G2(pub(crate) ArkG2Projective);

impl G2 {
    pub fn generator() -> Self {
        G2(ArkG2Projective::generator())
    }

    pub fn identity() -> Self {
        G2(ArkG2Projective::zero())
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: &G2) -> G2 {
        G2(self.0 + other.0)
    }

    pub fn scalar_mul(&self, s: &Fr) -> G2 {
        G2(self.0 * s.0)
    }

    /// Canonical 96-byte compressed encoding.
    pub fn to_compressed(&self) -> [u8; 96] {
        let mut buf = [0u8; 96];
        self.0
            .into_affine()
            .serialize_compressed(&mut buf[..])
            .expect("G2's canonical encoding is exactly 96 bytes");
        buf
    }

    pub fn from_compressed(bytes: &[u8; 96]) -> Result<Self, CoreError> {
        ArkG2Affine::deserialize_compressed(&bytes[..])
            .map(|a| G2(a.into()))
            .map_err(|_| CoreError::NotInSubgroup)
    }
}

impl PartialEq for G2 {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for G2 {}

impl Serialize for G2 {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        serde_bytes::serialize(&self.to_compressed()[..], s)
    }
}

impl<'de> Deserialize<'de> for G2 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = serde_bytes::deserialize(d)?;
        let arr: [u8; 96] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("G2 must be 96 bytes"))?;
        G2::from_compressed(&arr).map_err(|_| serde::de::Error::custom("invalid G2 encoding"))
    }
}

/// The optimal-ate pairing target group. Never persisted or sent over the
/// wire; consumed only as HKDF IKM by [`crate::ibe`].
#[derive(Clone, Copy)]
pub struct Gt(pub(crate) PairingOutput<Bls12_381>);

impl Gt {
    pub fn is_identity(&self) -> bool {
        self.0.is_zero()
    }

    /// Canonical byte encoding of the `Fq12` element, used as HKDF IKM.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.0.compressed_size());
        self.0
            .serialize_compressed(&mut buf)
            .expect("Gt serialization does not fail");
        buf
    }

    /// Raises this `GT` element to a scalar power, i.e. `self^s`. `arkworks`
    /// represents the target group additively, so exponentiation is scalar
    /// multiplication of the wrapped `PairingOutput`.
    pub fn pow(&self, s: &Fr) -> Gt {
        Gt(self.0 * s.0)
    }
}

impl PartialEq for Gt {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Gt {}

/// Computes the optimal-ate pairing `e(P, Q)`.
pub fn pair(p: &G1, q: &G2) -> Gt {
    Gt(Bls12_381::pairing(p.0.into_affine(), q.0.into_affine()))
}
