//! Hashing utilities for state and configuration comparison.
//!
//! Uses FNV-1a for fast, deterministic hashing. These hashes are not
//! cryptographically secure; they detect divergence between runs and
//! configuration drift between save and restore.

use flotsam_core::Point;
use flotsam_engine::{
    Simulation, SimulationConfig, SimulationState, SourceConfig, StencilPolicy, TracerVariant,
};
use flotsam_space::GridResolution;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Feed a single byte into an FNV-1a hash state.
#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

#[inline]
fn fnv1a_u32(hash: u64, v: u32) -> u64 {
    fnv1a_bytes(hash, &v.to_le_bytes())
}

#[inline]
fn fnv1a_u64(hash: u64, v: u64) -> u64 {
    fnv1a_bytes(hash, &v.to_le_bytes())
}

/// Floats are hashed by bit pattern, so `-0.0` and `0.0` differ.
#[inline]
fn fnv1a_f64(hash: u64, v: f64) -> u64 {
    fnv1a_u64(hash, v.to_bits())
}

fn fnv1a_point(hash: u64, p: Point) -> u64 {
    let hash = fnv1a_f64(hash, p.x);
    let hash = fnv1a_f64(hash, p.y);
    fnv1a_f64(hash, p.z)
}

fn fnv1a_opt_f64(hash: u64, v: Option<f64>) -> u64 {
    match v {
        Some(v) => fnv1a_f64(fnv1a_byte(hash, 1), v),
        None => fnv1a_byte(hash, 0),
    }
}

fn fnv1a_variant(mut hash: u64, variant: &TracerVariant) -> u64 {
    hash = fnv1a_byte(hash, variant.kind().tag());
    match variant {
        TracerVariant::Generic => hash,
        TracerVariant::Paper(p) => {
            hash = fnv1a_byte(hash, p.particulate as u8);
            hash = fnv1a_f64(hash, p.density);
            hash = fnv1a_f64(hash, p.radius);
            fnv1a_f64(hash, p.degradation_rate)
        }
        TracerVariant::Plastic(p) => {
            hash = fnv1a_byte(hash, p.particulate as u8);
            hash = fnv1a_f64(hash, p.density);
            hash = fnv1a_f64(hash, p.radius);
            hash = fnv1a_f64(hash, p.degradation_rate);
            fnv1a_byte(hash, p.polymer.tag())
        }
    }
}

fn fnv1a_source(mut hash: u64, source: &SourceConfig) -> u64 {
    hash = fnv1a_u32(hash, source.id.0);
    hash = fnv1a_u64(hash, source.name.len() as u64);
    hash = fnv1a_bytes(hash, source.name.as_bytes());
    hash = fnv1a_byte(hash, source.geometry.kind().tag());
    let vertices = source.geometry.vertices();
    hash = fnv1a_u64(hash, vertices.len() as u64);
    for v in vertices {
        hash = fnv1a_point(hash, v);
    }
    hash = fnv1a_f64(hash, source.rate);
    hash = fnv1a_variant(hash, &source.variant);
    hash = fnv1a_f64(hash, source.start);
    hash = fnv1a_opt_f64(hash, source.end);
    match source.stencil {
        StencilPolicy::Resample => fnv1a_byte(hash, 0),
        StencilPolicy::Fixed { points } => fnv1a_u32(fnv1a_byte(hash, 1), points),
    }
}

/// Compute a hash over everything in a configuration that affects how
/// the simulation evolves.
///
/// The diagnostics ring capacity is excluded: it changes what is
/// remembered, not what happens.
pub fn config_hash(config: &SimulationConfig) -> u64 {
    let mut hash = FNV_OFFSET;
    hash = fnv1a_point(hash, config.domain.min());
    hash = fnv1a_point(hash, config.domain.max());
    hash = match config.resolution {
        GridResolution::Cells { nx, ny } => fnv1a_u32(fnv1a_u32(fnv1a_byte(hash, 0), nx), ny),
        GridResolution::MinExtent(e) => fnv1a_f64(fnv1a_byte(hash, 1), e),
    };
    hash = fnv1a_f64(hash, config.dt);
    hash = fnv1a_f64(hash, config.start_time);
    hash = fnv1a_u64(hash, config.seed);
    hash = fnv1a_opt_f64(hash, config.tracer_lifetime);
    hash = fnv1a_u32(hash, config.max_cell_skip);
    hash = fnv1a_u64(hash, config.container.initial_capacity as u64);
    hash = fnv1a_f64(hash, config.container.growth_factor);
    hash = fnv1a_u64(hash, config.container.max_capacity as u64);
    hash = fnv1a_f64(hash, config.constants.water_density);
    hash = fnv1a_f64(hash, config.constants.gravity);
    hash = fnv1a_u64(hash, config.sources.len() as u64);
    for source in &config.sources {
        hash = fnv1a_source(hash, source);
    }
    hash
}

/// Compute a hash over a captured state.
///
/// Covers the clock, every container layout (which fixes future slot
/// reuse), every tracer and every source's statistics, in block order.
pub fn hash_state(state: &SimulationState) -> u64 {
    let mut hash = FNV_OFFSET;
    hash = fnv1a_u64(hash, state.step.0);
    hash = fnv1a_f64(hash, state.time);
    hash = fnv1a_u64(hash, state.next_tracer_id);
    for (i, block) in state.blocks.iter().enumerate() {
        // Fold in the block index at each boundary.
        hash = fnv1a_u64(hash, i as u64);
        for &g in &block.tracers.generations {
            hash = fnv1a_u32(hash, g);
        }
        for &f in &block.tracers.free_list {
            hash = fnv1a_u32(hash, f);
        }
        for (slot, tracer) in &block.tracer_slots {
            let state = tracer.state();
            hash = fnv1a_u32(hash, *slot);
            hash = fnv1a_u64(hash, tracer.id().0);
            hash = fnv1a_u32(hash, tracer.source().0);
            hash = fnv1a_point(hash, state.position);
            hash = fnv1a_point(hash, state.velocity);
            hash = fnv1a_f64(hash, state.age);
            hash = fnv1a_byte(hash, state.status.tag());
            hash = fnv1a_variant(hash, tracer.variant());
        }
        for &g in &block.sources.generations {
            hash = fnv1a_u32(hash, g);
        }
        for &f in &block.sources.free_list {
            hash = fnv1a_u32(hash, f);
        }
        for (slot, id, stats) in &block.source_slots {
            hash = fnv1a_u32(hash, *slot);
            hash = fnv1a_u32(hash, id.0);
            hash = fnv1a_u64(hash, stats.particles_emitted);
            hash = fnv1a_f64(hash, stats.carry);
            hash = fnv1a_u32(hash, stats.stencil_cursor);
        }
    }
    hash
}

/// Hash of a running simulation's full state.
pub fn state_hash(sim: &Simulation) -> u64 {
    hash_state(&sim.state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotsam_core::SourceId;
    use flotsam_space::{BoundingBox, Shape};

    fn config() -> SimulationConfig {
        let domain = BoundingBox::new(Point::ZERO, Point::xy(10.0, 10.0)).unwrap();
        SimulationConfig::new(domain, GridResolution::Cells { nx: 2, ny: 2 }, 1.0).with_source(
            SourceConfig::new(
                SourceId(0),
                "outfall",
                Shape::point(Point::xy(1.0, 1.0)).unwrap(),
                1.0,
            ),
        )
    }

    #[test]
    fn config_hash_same_inputs_same_output() {
        assert_eq!(config_hash(&config()), config_hash(&config()));
    }

    #[test]
    fn config_hash_sees_seed_dt_and_sources() {
        let base = config_hash(&config());

        let mut seeded = config();
        seeded.seed = 1;
        assert_ne!(config_hash(&seeded), base);

        let mut faster = config();
        faster.dt = 0.5;
        assert_ne!(config_hash(&faster), base);

        let mut busier = config();
        busier.sources[0].rate = 2.0;
        assert_ne!(config_hash(&busier), base);

        let mut renamed = config();
        renamed.sources[0].name = "spill".into();
        assert_ne!(config_hash(&renamed), base);
    }

    #[test]
    fn config_hash_ignores_diagnostics_capacity() {
        let mut quiet = config();
        quiet.diagnostics_capacity = 1;
        assert_eq!(config_hash(&quiet), config_hash(&config()));
    }

    #[test]
    fn empty_state_hash_folds_only_the_clock() {
        let state = SimulationState {
            step: flotsam_core::StepId(0),
            time: 0.0,
            next_tracer_id: 0,
            blocks: vec![],
        };
        let expected = fnv1a_u64(fnv1a_f64(fnv1a_u64(FNV_OFFSET, 0), 0.0), 0);
        assert_eq!(hash_state(&state), expected);
    }

    #[test]
    fn fresh_simulations_hash_alike() {
        let a = Simulation::new(config()).unwrap();
        let b = Simulation::new(config()).unwrap();
        assert_eq!(state_hash(&a), state_hash(&b));
    }
}
