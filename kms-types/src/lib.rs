//! Shared data model, wire messages, and external-collaborator interfaces
//! for the distributed threshold KMS.
//!
//! This crate defines types only; the chain indexer, attestation verifiers,
//! and transport that implement [`collaborators`] live outside the core.

pub mod collaborators;
pub mod ids;
pub mod model;
pub mod wire;

pub use ids::{derive_node_id, Epoch, NodeId};
pub use model::{
    Acknowledgement, AttestationClaims, AttestationMethod, BlockEvent, CompletionSignature,
    KeyShareVersion, MerkleProof, OperatorDirectoryEntry, Release,
};
pub use wire::{
    AppSignRequest, AppSignResponse, Deal, OperatorSet, PubKeyQuery, PubKeyResponse,
    SecretsRequest, SecretsResponse, MIN_PRODUCTION_RSA_BITS,
};
