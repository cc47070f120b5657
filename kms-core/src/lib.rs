//! Cryptographic core of the distributed threshold KMS.
//!
//! This crate is pure math: curve arithmetic (C1), the polynomial/Shamir
//! kernel (C2), and the Boneh–Franklin IBE codec (C3). It has no networking,
//! no persistence, and no knowledge of operator identities beyond the
//! `NodeId` it interpolates at. Higher layers (`kms-protocol`, `kms-node`,
//! `kms-client`) build the DKG/Reshare state machines, the Merkle ack layer,
//! and the service surface on top of it.

pub mod curve;
pub mod error;
pub mod ibe;
pub mod shamir;

pub use curve::{Fr, G1, G2, Gt};
pub use error::CoreError;
pub use shamir::{threshold, NodeId, Polynomial};
