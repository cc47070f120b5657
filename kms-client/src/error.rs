//! Client-side errors (§7).

use thiserror::Error;

pub use kms_core::CoreError;

/// Errors surfaced by the threshold combiner and client IBE wrappers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Forwarded from the cryptographic core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Fewer than `t` partial signatures survived verification.
    #[error("insufficient partial signatures: need {needed}, have {have}")]
    InsufficientPartials {
        /// Minimum partials required.
        needed: u32,
        /// Partials that verified successfully.
        have: u32,
    },

    /// A queried operator's self-reported address did not match the address
    /// it was queried under (§7 security note).
    #[error("responder address mismatch")]
    Unauthorized,
}
