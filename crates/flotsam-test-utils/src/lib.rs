//! Test utilities and mock types for Flotsam development.
//!
//! Provides mock [`VelocitySampler`](flotsam_core::VelocitySampler) and
//! [`Integrator`](flotsam_engine::Integrator) implementations plus small
//! configuration fixtures for building test scenarios.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use flotsam_core::{Point, SamplerError, VelocitySampler};
use flotsam_engine::{Advance, IntegrationContext, IntegrationHint, Integrator, TracerState};

/// Returns the same velocity everywhere, always.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantVelocity(pub Point);

impl VelocitySampler for ConstantVelocity {
    fn sample(&self, _position: Point, _time: f64) -> Result<Point, SamplerError> {
        Ok(self.0)
    }
}

/// Solid-body rotation about `centre` with angular speed `omega`.
///
/// Keeps tracers on circles, which makes long deterministic runs cheap to
/// reason about.
#[derive(Clone, Copy, Debug)]
pub struct Rotation {
    pub centre: Point,
    pub omega: f64,
}

impl VelocitySampler for Rotation {
    fn sample(&self, position: Point, _time: f64) -> Result<Point, SamplerError> {
        let r = position - self.centre;
        Ok(Point::xy(-self.omega * r.y, self.omega * r.x))
    }
}

/// Succeeds a configurable number of times, then reports no data.
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Sync`.
#[derive(Debug)]
pub struct FailingSampler {
    pub velocity: Point,
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingSampler {
    /// A sampler that returns `velocity` `succeed_count` times then fails.
    pub fn new(velocity: Point, succeed_count: usize) -> Self {
        Self {
            velocity,
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `sample()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl VelocitySampler for FailingSampler {
    fn sample(&self, _position: Point, time: f64) -> Result<Point, SamplerError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(SamplerError::NoData { time });
        }
        Ok(self.velocity)
    }
}

/// Returns a NaN velocity for positions right of `x`, zero elsewhere.
#[derive(Clone, Copy, Debug)]
pub struct NanBeyond {
    pub x: f64,
}

impl VelocitySampler for NanBeyond {
    fn sample(&self, position: Point, _time: f64) -> Result<Point, SamplerError> {
        if position.x > self.x {
            Ok(Point::xy(f64::NAN, 0.0))
        } else {
            Ok(Point::ZERO)
        }
    }
}

/// Forward Euler that beaches any tracer whose step would leave the
/// domain, clamping it onto the shore.
#[derive(Clone, Copy, Debug, Default)]
pub struct BeachingIntegrator;

impl Integrator for BeachingIntegrator {
    fn advance(
        &self,
        state: &TracerState,
        velocity: Point,
        _hint: &IntegrationHint,
        ctx: &IntegrationContext<'_>,
    ) -> Advance {
        let target = state.position + velocity * ctx.dt;
        if ctx.domain.contains(&target) {
            Advance {
                position: target,
                velocity,
                beached: false,
            }
        } else {
            Advance {
                position: ctx.domain.clamp(target),
                velocity: Point::ZERO,
                beached: true,
            }
        }
    }
}

/// Records every hint it sees; moves nothing.
#[derive(Debug, Default)]
pub struct HintRecorder {
    seen: std::sync::Mutex<Vec<IntegrationHint>>,
}

impl HintRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every hint passed so far, in call order.
    pub fn hints(&self) -> Vec<IntegrationHint> {
        match self.seen.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Integrator for HintRecorder {
    fn advance(
        &self,
        state: &TracerState,
        _velocity: Point,
        hint: &IntegrationHint,
        _ctx: &IntegrationContext<'_>,
    ) -> Advance {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(*hint);
        }
        Advance {
            position: state.position,
            velocity: Point::ZERO,
            beached: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_sampler_counts_calls() {
        let s = FailingSampler::new(Point::xy(1.0, 0.0), 2);
        assert!(s.sample(Point::ZERO, 0.0).is_ok());
        assert!(s.sample(Point::ZERO, 0.0).is_ok());
        assert!(matches!(
            s.sample(Point::ZERO, 3.0),
            Err(SamplerError::NoData { .. })
        ));
        assert_eq!(s.calls(), 3);
    }

    #[test]
    fn rotation_is_perpendicular() {
        let r = Rotation {
            centre: Point::xy(5.0, 5.0),
            omega: 1.0,
        };
        let v = r.sample(Point::xy(6.0, 5.0), 0.0).unwrap();
        assert_eq!(v, Point::xy(0.0, 1.0));
    }
}
