//! Container growth parameters.

/// Growth policy for a [`ContainerArray`](crate::ContainerArray).
///
/// Validated by the owning simulation's configuration pass; all values are
/// immutable after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerConfig {
    /// Number of slots allocated on the first insertion.
    ///
    /// Default: 64. Must be at least 1.
    pub initial_capacity: usize,

    /// Multiplicative factor applied to the capacity on each growth step.
    ///
    /// Default: 2.0. Must be finite and greater than 1.0 so that insertion
    /// stays amortised O(1).
    pub growth_factor: f64,

    /// Hard limit on the number of slots.
    ///
    /// Default: `u32::MAX` (slot indices are `u32`). Growth past this
    /// limit fails with `CapacityExceeded`.
    pub max_capacity: usize,
}

impl ContainerConfig {
    /// Default initial capacity.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

    /// Default growth factor (doubling).
    pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

    /// Largest capacity addressable by a `u32` slot index.
    pub const MAX_ADDRESSABLE: usize = u32::MAX as usize;

    /// Create a config with the given initial capacity and default growth.
    pub fn with_initial_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_capacity == 0 {
            return Err("initial_capacity must be at least 1".to_string());
        }
        if !self.growth_factor.is_finite() || self.growth_factor <= 1.0 {
            return Err(format!(
                "growth_factor must be finite and > 1.0, got {}",
                self.growth_factor
            ));
        }
        if self.max_capacity < self.initial_capacity {
            return Err(format!(
                "max_capacity {} is below initial_capacity {}",
                self.max_capacity, self.initial_capacity
            ));
        }
        if self.max_capacity > Self::MAX_ADDRESSABLE {
            return Err(format!(
                "max_capacity {} exceeds u32 slot addressing",
                self.max_capacity
            ));
        }
        Ok(())
    }

    /// Capacity after one growth step from `current`, before clamping to
    /// `max_capacity`.
    pub(crate) fn next_capacity(&self, current: usize) -> usize {
        if current == 0 {
            return self.initial_capacity.max(1);
        }
        let grown = (current as f64 * self.growth_factor).ceil();
        if grown >= usize::MAX as f64 {
            return usize::MAX;
        }
        (grown as usize).max(current + 1)
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            max_capacity: Self::MAX_ADDRESSABLE,
        }
    }
}
