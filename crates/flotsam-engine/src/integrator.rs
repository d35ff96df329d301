//! The integration seam.
//!
//! The engine samples the forcing velocity for each active tracer and hands
//! it to an [`Integrator`], which returns the new position. The integrator
//! sees the tracer's variant only through its [`IntegrationHint`].

use flotsam_core::Point;
use flotsam_space::BoundingBox;

use crate::config::PhysicalConstants;
use crate::tracer::{IntegrationHint, TracerState};

/// Read-only step context passed to every integration call.
#[derive(Clone, Copy, Debug)]
pub struct IntegrationContext<'a> {
    /// Simulation time at the start of the step.
    pub time: f64,
    /// Step length.
    pub dt: f64,
    /// Global domain box.
    pub domain: &'a BoundingBox,
    /// Physical constants.
    pub constants: &'a PhysicalConstants,
}

/// Outcome of integrating one tracer over one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Advance {
    /// Position at the end of the step.
    pub position: Point,
    /// Velocity applied over the step.
    pub velocity: Point,
    /// Whether the tracer came to rest on a shore.
    pub beached: bool,
}

/// Moves one tracer through one time step.
///
/// Called concurrently from several blocks, hence `Send + Sync`.
pub trait Integrator: Send + Sync {
    /// Advance `state` given the sampled forcing `velocity`.
    fn advance(
        &self,
        state: &TracerState,
        velocity: Point,
        hint: &IntegrationHint,
        ctx: &IntegrationContext<'_>,
    ) -> Advance;
}

/// Forward Euler: `x' = x + v * dt`. Never beaches.
#[derive(Clone, Copy, Debug, Default)]
pub struct EulerIntegrator;

impl Integrator for EulerIntegrator {
    fn advance(
        &self,
        state: &TracerState,
        velocity: Point,
        _hint: &IntegrationHint,
        ctx: &IntegrationContext<'_>,
    ) -> Advance {
        Advance {
            position: state.position + velocity * ctx.dt,
            velocity,
            beached: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::TracerStatus;

    #[test]
    fn euler_moves_by_velocity_times_dt() {
        let domain = BoundingBox::new(Point::ZERO, Point::xy(10.0, 10.0)).unwrap();
        let constants = PhysicalConstants::default();
        let ctx = IntegrationContext {
            time: 0.0,
            dt: 0.5,
            domain: &domain,
            constants: &constants,
        };
        let state = TracerState {
            position: Point::xy(1.0, 1.0),
            velocity: Point::ZERO,
            age: 0.0,
            status: TracerStatus::Active,
        };
        let out = EulerIntegrator.advance(
            &state,
            Point::xy(4.0, -2.0),
            &IntegrationHint::default(),
            &ctx,
        );
        assert_eq!(out.position, Point::xy(3.0, 0.0));
        assert_eq!(out.velocity, Point::xy(4.0, -2.0));
        assert!(!out.beached);
    }
}
