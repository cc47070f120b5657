//! Stable identifiers: operator node IDs and protocol epochs.
//!
//! Node IDs are a single wide, nonzero, unsigned integer used everywhere,
//! including as map keys for shares and partial signatures.

use std::fmt;

use alloy::primitives::{keccak256, Address};
use serde::{Deserialize, Serialize};

/// A non-zero, stable operator identifier derived from an on-chain address
/// (§3, §6). Lagrange interpolation is performed at these IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Returns the raw integer value, e.g. to hand to `kms_core::shamir`.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Fixed-width 8-byte big-endian encoding, used in the ack leaf layout
    /// (§6).
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `nodeID(addr) = uint64(keccak256(addr)[0..8])`, high bit cleared by the
/// truncation (§6). The chain's registry uses the same function; both MUST
/// agree.
pub fn derive_node_id(addr: Address) -> NodeId {
    let digest = keccak256(addr);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[0..8]);
    let raw = u64::from_be_bytes(buf);
    NodeId(raw & 0x7fff_ffff_ffff_ffff)
}

/// A numbered time window during which exactly one `KeyShareVersion` is
/// active (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(pub u64);

impl Epoch {
    /// Epoch zero: the initial DKG epoch.
    pub const GENESIS: Epoch = Epoch(0);

    /// Returns the next epoch in sequence.
    pub fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }

    /// Whether this is the genesis (DKG) epoch as opposed to a reshare
    /// epoch.
    pub fn is_genesis(self) -> bool {
        self.0 == 0
    }

    /// Fixed-width 32-byte big-endian encoding used in the ack leaf layout
    /// (§6), which reserves a full 256-bit field for the epoch.
    pub fn to_be_bytes32(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[24..32].copy_from_slice(&self.0.to_be_bytes());
        out
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_high_bit_is_always_clear() {
        for byte in 0u8..=255 {
            let addr = Address::repeat_byte(byte);
            let id = derive_node_id(addr);
            assert_eq!(id.0 & 0x8000_0000_0000_0000, 0);
        }
    }

    #[test]
    fn epoch_encodes_into_32_bytes_big_endian() {
        let e = Epoch(0x0102_0304);
        let bytes = e.to_be_bytes32();
        assert_eq!(&bytes[28..32], &[0x01, 0x02, 0x03, 0x04]);
        assert!(bytes[0..28].iter().all(|&b| b == 0));
    }
}
