//! Slot handles.
//!
//! A [`SlotIndex`] names a slot and the generation that slot had when the
//! handle was issued, allowing O(1) staleness checks without a lookup table.

use std::fmt;

/// Stable handle to an element in a [`ContainerArray`](crate::ContainerArray).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct SlotIndex {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl SlotIndex {
    /// Build a handle from raw parts.
    ///
    /// Used when restoring checkpoints; the handle is only valid if the
    /// container's slot currently carries the same generation.
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Position of the slot in the container.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.index, self.generation)
    }
}
