//! Checkpoints and state hashing for Flotsam simulations.
//!
//! A checkpoint captures the full mutable state of a
//! [`Simulation`](flotsam_engine::Simulation): the clock, every block's
//! container layout and tracers, and each source's emission statistics.
//! Restoring it under the same configuration yields a simulation that
//! continues exactly as the original would have.
//!
//! # Architecture
//!
//! - [`save`] writes a checkpoint to any `Write` sink
//! - [`restore`] rebuilds a simulation from any `Read` source
//! - [`state_hash`] and [`config_hash`] fingerprint state for comparison
//! - All I/O uses a custom binary codec (no serde dependency)
//!
//! # Format
//!
//! ```text
//! [MAGIC "FLTS"] [VERSION u8] [config hash u64]
//! [step u64] [time f64] [next tracer id u64]
//! [block count u32] [Block 0] [Block 1] ... [Block N-1]
//! ```
//!
//! Each block holds its tracer container layout and tracers by slot,
//! then its source container layout and per-source statistics.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod hash;
pub mod reader;
pub mod writer;

pub use error::CheckpointError;
pub use hash::{config_hash, hash_state, state_hash};
pub use reader::{read_state, restore};
pub use writer::{save, write_state};

/// Magic bytes at the start of every checkpoint.
pub const MAGIC: [u8; 4] = *b"FLTS";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
