//! Error types for geometry and grid construction.

use std::fmt;

/// Errors arising from malformed geometry or grid parameters.
///
/// All of these are construction-time failures: a simulation whose
/// configuration produces one does not start.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceError {
    /// A shape was given fewer points than its kind requires.
    TooFewPoints {
        /// Shape kind being built.
        kind: &'static str,
        /// Minimum number of points.
        required: usize,
        /// Number supplied.
        got: usize,
    },
    /// A shape was given more points than its kind accepts.
    TooManyPoints {
        /// Shape kind being built.
        kind: &'static str,
        /// Maximum number of points.
        allowed: usize,
        /// Number supplied.
        got: usize,
    },
    /// A coordinate was NaN or infinite.
    NonFinite {
        /// What was being built.
        what: &'static str,
    },
    /// A box has `min > max` on some axis.
    InvertedBox {
        /// Offending axis.
        axis: char,
        /// Lower bound supplied.
        min: f64,
        /// Upper bound supplied.
        max: f64,
    },
    /// The domain has zero width or height.
    DegenerateDomain,
    /// A grid was requested with zero blocks along an axis.
    EmptyGrid,
    /// A block extent was not finite and positive.
    InvalidExtent {
        /// The value supplied.
        value: f64,
    },
    /// A grid dimension is too large for `u32` block ids.
    DimensionTooLarge {
        /// Which dimension.
        name: &'static str,
        /// The value supplied.
        value: u64,
        /// The maximum allowed.
        max: u64,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints {
                kind,
                required,
                got,
            } => write!(f, "{kind} needs at least {required} points, got {got}"),
            Self::TooManyPoints { kind, allowed, got } => {
                write!(f, "{kind} takes at most {allowed} points, got {got}")
            }
            Self::NonFinite { what } => write!(f, "{what} has a non-finite coordinate"),
            Self::InvertedBox { axis, min, max } => {
                write!(f, "box min {min} exceeds max {max} on {axis} axis")
            }
            Self::DegenerateDomain => write!(f, "domain has zero width or height"),
            Self::EmptyGrid => write!(f, "grid must have at least one block per axis"),
            Self::InvalidExtent { value } => {
                write!(f, "block extent must be finite and positive, got {value}")
            }
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "{name} = {value} exceeds maximum {max}")
            }
        }
    }
}

impl std::error::Error for SpaceError {}
