//! Protocol state machines built on `kms-core`: Distributed Key Generation
//! (C4), proactive/committee-change Reshare (C5), and the acknowledgement /
//! Merkle-commitment layer (C6). Pure state machines — no networking, no
//! persistence; the orchestrator (`kms-node`) drives them and owns I/O.

pub mod dkg;
pub mod error;
pub mod merkle;
pub mod reshare;

pub use error::ProtocolError;
