//! Memory footprint of a container, for diagnostics.

use std::fmt;

/// Capacity and byte usage of one container.
///
/// Passive bookkeeping only; produced by
/// [`ContainerArray::footprint`](crate::ContainerArray::footprint) and summed
/// by the simulation's memory report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContainerFootprint {
    /// Allocated slots.
    pub capacity: usize,
    /// Slots holding an element.
    pub used: usize,
    /// Slots on the free list.
    pub free: usize,
    /// Size of one slot in bytes.
    pub slot_bytes: usize,
    /// Total heap bytes held by the container.
    pub bytes: usize,
}

impl ContainerFootprint {
    /// Fold another footprint into this one.
    ///
    /// `slot_bytes` is kept from whichever side is non-zero; summing
    /// footprints of different element types is meaningless for that field.
    pub fn accumulate(&mut self, other: &ContainerFootprint) {
        self.capacity += other.capacity;
        self.used += other.used;
        self.free += other.free;
        self.bytes += other.bytes;
        if self.slot_bytes == 0 {
            self.slot_bytes = other.slot_bytes;
        }
    }

    /// Fraction of allocated slots in use, `0.0` for an empty container.
    pub fn occupancy(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.used as f64 / self.capacity as f64
    }
}

impl fmt::Display for ContainerFootprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} slots used, {} bytes",
            self.used, self.capacity, self.bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_sums_counts() {
        let mut a = ContainerFootprint {
            capacity: 8,
            used: 3,
            free: 5,
            slot_bytes: 16,
            bytes: 128,
        };
        let b = ContainerFootprint {
            capacity: 4,
            used: 4,
            free: 0,
            slot_bytes: 16,
            bytes: 64,
        };
        a.accumulate(&b);
        assert_eq!(a.capacity, 12);
        assert_eq!(a.used, 7);
        assert_eq!(a.free, 5);
        assert_eq!(a.bytes, 192);
        assert_eq!(a.slot_bytes, 16);
    }

    #[test]
    fn occupancy_of_empty_is_zero() {
        assert_eq!(ContainerFootprint::default().occupancy(), 0.0);
    }
}
