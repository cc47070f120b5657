//! Test-only fakes and an end-to-end scenario harness for `kms-node`.

pub mod fakes;
pub mod scenario;

pub use fakes::{
    BlockEventPump, MemoryNetwork, NetworkPeerTransport, RecordingMerkleRootSink,
    StaticOperatorDirectory, StaticReleaseRegistry,
};
pub use scenario::{Committee, TestNode};
