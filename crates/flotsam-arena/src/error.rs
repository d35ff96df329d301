//! Container-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during container operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerError {
    /// The handle points at a free slot, or at a slot that was freed and
    /// reused since the handle was issued.
    StaleIndex {
        /// Raw slot index of the handle.
        index: u32,
        /// Generation encoded in the handle.
        generation: u32,
    },
    /// Growing the container would exceed its capacity limit, or the
    /// allocator refused the reservation.
    CapacityExceeded {
        /// Capacity the growth step asked for.
        requested: usize,
        /// Configured hard limit.
        limit: usize,
    },
    /// A layout handed to [`ContainerArray::from_layout`](crate::ContainerArray::from_layout)
    /// is inconsistent.
    InvalidLayout {
        /// What was wrong with it.
        reason: String,
    },
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleIndex { index, generation } => {
                write!(f, "stale slot index {index} (generation {generation})")
            }
            Self::CapacityExceeded { requested, limit } => {
                write!(
                    f,
                    "container capacity exceeded: requested {requested} slots, limit {limit}"
                )
            }
            Self::InvalidLayout { reason } => write!(f, "invalid container layout: {reason}"),
        }
    }
}

impl Error for ContainerError {}
