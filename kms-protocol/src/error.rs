//! Error kinds for the DKG, Reshare, and Ack/Merkle engines (§7).

use thiserror::Error;

pub use kms_core::CoreError;

/// Errors the protocol engines surface to the orchestrator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Forwarded from the cryptographic core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The epoch's wall-clock budget was exceeded.
    #[error("epoch timed out")]
    Timeout,

    /// A peer was unreachable, or local RNG was unavailable; the caller
    /// should retry with backoff.
    #[error("transient failure")]
    Transient,
}
