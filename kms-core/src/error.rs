//! Error kinds emitted by the cryptographic core.
//!
//! None of these variants may carry secret material (share values, polynomial
//! coefficients) in their `Display` output.

use thiserror::Error;

/// Errors surfaced by curve primitives, the Shamir kernel, and the IBE codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A byte string failed framing, decompression, or a canonical-encoding check.
    #[error("invalid encoding")]
    InvalidEncoding,

    /// A curve point decompressed but failed prime-order subgroup membership.
    #[error("point not in prime-order subgroup")]
    NotInSubgroup,

    /// The Feldman/Pedersen verification equation did not hold for a share.
    #[error("invalid share")]
    InvalidShare,

    /// A reshare dealer's claimed constant-term commitment disagreed with the
    /// previously-published aggregate commitment for that dealer.
    #[error("dealer equivocated on reshare commitment")]
    DealerEquivocation,

    /// Fewer than `t` valid contributions were collected before the deadline.
    #[error("insufficient dealers: need {needed}, have {have}")]
    InsufficientDealers {
        /// Minimum dealers required.
        needed: u32,
        /// Dealers actually collected.
        have: u32,
    },

    /// The client combiner was given fewer than `t` partial signatures.
    #[error("insufficient partial signatures: need {needed}, have {have}")]
    InsufficientPartials {
        /// Minimum partials required.
        needed: u32,
        /// Partials actually supplied.
        have: u32,
    },

    /// AES-256-GCM authentication failed on decryption.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The application identity did not meet the minimum length requirement.
    #[error("application identity too short")]
    IdentityTooShort,

    /// A degenerate master public key (identity point, or one that pairs to
    /// the identity of `GT`) was supplied to `Encrypt`.
    #[error("degenerate master public key")]
    DegenerateMasterKey,

    /// Lagrange interpolation was attempted over a set that is empty, does
    /// not contain the evaluation index, or contains a duplicate/zero id.
    #[error("invalid interpolation set")]
    InvalidInterpolationSet,
}
