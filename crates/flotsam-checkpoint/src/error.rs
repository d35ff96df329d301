//! Error types for checkpointing.

use std::fmt;
use std::io;

use flotsam_engine::RestoreError;

/// Errors that can occur while writing or reading a checkpoint.
#[derive(Debug)]
pub enum CheckpointError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The data does not start with the expected `b"FLTS"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the data.
        found: u8,
    },
    /// The body could not be decoded (bad tag, trailing bytes, absurd
    /// length).
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The checkpoint was taken under a different configuration.
    ConfigMismatch {
        /// Hash from the checkpoint header.
        recorded: u64,
        /// Hash computed from the supplied configuration.
        current: u64,
    },
    /// The decoded state is inconsistent with the configuration.
    Restore(RestoreError),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"FLTS\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed checkpoint: {detail}"),
            Self::ConfigMismatch { recorded, current } => {
                write!(
                    f,
                    "config hash mismatch: recorded={recorded:#018x}, current={current:#018x}"
                )
            }
            Self::Restore(e) => write!(f, "restore failed: {e}"),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Restore(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CheckpointError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<RestoreError> for CheckpointError {
    fn from(e: RestoreError) -> Self {
        Self::Restore(e)
    }
}
