//! Seams to external collaborators.

use crate::error::SamplerError;
use crate::point::Point;

/// Supplies the forcing velocity at a position and time.
///
/// Called once per step for every Active tracer, possibly from several
/// worker threads at once (one per block), hence `Send + Sync`.
/// Implementations backed by gridded hydrodynamic output interpolate in
/// space and time; test doubles return constants.
pub trait VelocitySampler: Send + Sync {
    /// Velocity at `position` and simulation `time`.
    fn sample(&self, position: Point, time: f64) -> Result<Point, SamplerError>;
}

impl<F> VelocitySampler for F
where
    F: Fn(Point, f64) -> Result<Point, SamplerError> + Send + Sync,
{
    fn sample(&self, position: Point, time: f64) -> Result<Point, SamplerError> {
        self(position, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_samplers() {
        let sampler = |p: Point, _t: f64| Ok(Point::xy(p.y, -p.x));
        let v = VelocitySampler::sample(&sampler, Point::xy(1.0, 2.0), 0.0).unwrap();
        assert_eq!(v, Point::xy(2.0, -1.0));
    }
}
