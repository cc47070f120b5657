//! Client-side primitives for the distributed threshold KMS: the threshold
//! partial-signature combiner (with full per-share pairing verification),
//! master-public-key resolution across operator responses, and IBE
//! encrypt/decrypt convenience wrappers.

pub mod combiner;
pub mod error;
pub mod ibe;
pub mod pubkey;

pub use combiner::{combine, verify_partial, PartialSignature};
pub use error::ClientError;
pub use pubkey::{resolve as resolve_master_public_key, AgreementPolicy};
