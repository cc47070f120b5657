//! Acknowledgement / Merkle-commitment layer.
//!
//! Builds a keccak256 pairwise-hash Merkle tree over a round's
//! acknowledgements, using `alloy::primitives::keccak256` for hashing
//! consistency with `NodeId` derivation and with the on-chain verifier
//! both sides must agree with.

use alloy::primitives::keccak256;
use kms_types::{Acknowledgement, Epoch, MerkleProof, NodeId};

/// Fixed-width leaf encoding (§6): `playerID(8) || dealerID(8) || epoch(32)
/// || shareHash(32) || commitmentHash(32)`, all big-endian.
pub fn leaf_encoding(ack: &Acknowledgement) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + 8 + 32 + 32 + 32);
    buf.extend_from_slice(&ack.player_id.to_be_bytes());
    buf.extend_from_slice(&ack.dealer_id.to_be_bytes());
    buf.extend_from_slice(&ack.epoch.to_be_bytes32());
    buf.extend_from_slice(&ack.share_hash);
    buf.extend_from_slice(&ack.commitment_hash);
    buf
}

/// `shareHash = keccak256(share.bytes)` (§3, §6).
pub fn share_hash(share: &kms_core::Fr) -> [u8; 32] {
    keccak256(share.to_bytes()).into()
}

/// `commitmentHash = keccak256(concat(compressed(c_k) for k in 0..t))`
/// (§3, §6).
pub fn commitment_hash(commitments: &[kms_core::G2]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(commitments.len() * 96);
    for c in commitments {
        buf.extend_from_slice(&c.to_compressed());
    }
    keccak256(buf).into()
}

/// A binary Merkle tree over acknowledgement leaves, with duplicate-last-
/// leaf padding at odd levels (§4.6).
pub struct AckMerkleTree {
    /// Levels from the leaves (index 0) up to the root (last index).
    levels: Vec<Vec<[u8; 32]>>,
}

impl AckMerkleTree {
    /// Canonicalizes `acks` by sorting on `player_id` ascending, then builds
    /// the tree over their leaf hashes.
    pub fn build(acks: &[Acknowledgement]) -> Self {
        let mut sorted: Vec<&Acknowledgement> = acks.iter().collect();
        sorted.sort_by_key(|a| a.player_id);

        let leaves: Vec<[u8; 32]> = sorted
            .iter()
            .map(|a| keccak256(leaf_encoding(a)).into())
            .collect();

        let mut levels = vec![leaves];
        while levels.last().unwrap().len() > 1 {
            let prev = levels.last().unwrap();
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));
            let mut i = 0;
            while i < prev.len() {
                let left = prev[i];
                let right = if i + 1 < prev.len() { prev[i + 1] } else { left };
                let mut buf = Vec::with_capacity(64);
                buf.extend_from_slice(&left);
                buf.extend_from_slice(&right);
                next.push(keccak256(buf).into());
                i += 2;
            }
            levels.push(next);
        }
        AckMerkleTree { levels }
    }

    /// The number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// The posted Merkle root.
    pub fn root(&self) -> [u8; 32] {
        *self.levels.last().unwrap().last().unwrap()
    }

    /// The sibling path for the leaf at `leaf_index`, from the leaf level up
    /// to (but excluding) the root.
    pub fn proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        if leaf_index >= self.leaf_count() {
            return None;
        }
        let mut siblings = Vec::new();
        let mut idx = leaf_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            let sibling = if sibling_idx < level.len() {
                level[sibling_idx]
            } else {
                level[idx]
            };
            siblings.push(sibling);
            idx /= 2;
        }
        Some(MerkleProof {
            leaf_index,
            siblings,
        })
    }
}

/// Recomputes a root from a claimed leaf encoding and sibling path, and
/// checks it against `expected_root` (§4.6 "Verification of a proof").
pub fn verify_proof(leaf: [u8; 32], proof: &MerkleProof, expected_root: [u8; 32]) -> bool {
    let mut acc = leaf;
    let mut idx = proof.leaf_index;
    for sibling in &proof.siblings {
        let mut buf = Vec::with_capacity(64);
        if idx % 2 == 0 {
            buf.extend_from_slice(&acc);
            buf.extend_from_slice(sibling);
        } else {
            buf.extend_from_slice(sibling);
            buf.extend_from_slice(&acc);
        }
        acc = keccak256(buf).into();
        idx /= 2;
    }
    acc == expected_root
}

/// One dealer's posted ack summary (§4.6 point 4): `(dealerID, epoch, root,
/// len(A_d))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckRootPosting {
    /// The dealer posting this root.
    pub dealer_id: NodeId,
    /// The epoch the acks belong to.
    pub epoch: Epoch,
    /// The Merkle root over the dealer's accepted acks.
    pub root: [u8; 32],
    /// The number of acks folded into `root`.
    pub leaf_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kms_core::{Fr, G2};

    fn ack(player: u64, dealer: u64) -> Acknowledgement {
        Acknowledgement {
            player_id: NodeId(player),
            dealer_id: NodeId(dealer),
            epoch: Epoch(0),
            share_hash: share_hash(&Fr::one()),
            commitment_hash: commitment_hash(&[G2::generator()]),
            signature: vec![0u8; 65],
        }
    }

    #[test]
    fn determinism_scenario_property_law_10() {
        let acks = vec![ack(3, 1), ack(1, 1), ack(2, 1), ack(4, 1)];
        let tree_a = AckMerkleTree::build(&acks);
        let mut reordered = acks.clone();
        reordered.reverse();
        let tree_b = AckMerkleTree::build(&reordered);
        assert_eq!(tree_a.root(), tree_b.root());
    }

    #[test]
    fn every_leaf_has_a_valid_proof() {
        let acks = vec![ack(1, 1), ack(2, 1), ack(3, 1), ack(4, 1), ack(5, 1)];
        let tree = AckMerkleTree::build(&acks);
        let mut sorted = acks.clone();
        sorted.sort_by_key(|a| a.player_id);
        for (i, a) in sorted.iter().enumerate() {
            let leaf: [u8; 32] = keccak256(leaf_encoding(a)).into();
            let proof = tree.proof(i).unwrap();
            assert!(verify_proof(leaf, &proof, tree.root()));
        }
    }

    #[test]
    fn tampered_proof_is_rejected() {
        let acks = vec![ack(1, 1), ack(2, 1), ack(3, 1)];
        let tree = AckMerkleTree::build(&acks);
        let mut proof = tree.proof(0).unwrap();
        proof.siblings[0][0] ^= 0x01;
        let leaf: [u8; 32] = keccak256(leaf_encoding(&ack(1, 1))).into();
        assert!(!verify_proof(leaf, &proof, tree.root()));
    }
}
