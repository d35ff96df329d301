//! Binary encode/decode for the checkpoint format.
//!
//! All integers and floats are little-endian. Sequences are prefixed with
//! a `u32` count. No compression, no alignment padding, no self-describing
//! schema: the reader must know the format version.

use std::io::{Read, Write};

use flotsam_arena::ContainerLayout;
use flotsam_core::{Point, SourceId, StepId, TracerId};
use flotsam_engine::{
    BlockState, PaperParams, PlasticParams, Polymer, SimulationState, SourceStats, Tracer,
    TracerState, TracerStatus, TracerVariant,
};

use crate::error::CheckpointError;
use crate::{FORMAT_VERSION, MAGIC};

/// Cap on speculative preallocation from a decoded count, so a corrupt
/// length cannot exhaust memory before the read fails.
const MAX_PREALLOC: usize = 4096;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), CheckpointError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CheckpointError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), CheckpointError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), CheckpointError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a point as three f64s.
pub fn write_point(w: &mut dyn Write, p: Point) -> Result<(), CheckpointError> {
    write_f64_le(w, p.x)?;
    write_f64_le(w, p.y)?;
    write_f64_le(w, p.z)
}

/// Write a sequence count, rejecting anything that does not fit a u32.
fn write_count(w: &mut dyn Write, n: usize) -> Result<(), CheckpointError> {
    let n = u32::try_from(n).map_err(|_| CheckpointError::Malformed {
        detail: format!("sequence of {n} elements exceeds u32"),
    })?;
    write_u32_le(w, n)
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, CheckpointError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, CheckpointError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, CheckpointError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, CheckpointError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a point written by [`write_point`].
pub fn read_point(r: &mut dyn Read) -> Result<Point, CheckpointError> {
    Ok(Point::new(read_f64_le(r)?, read_f64_le(r)?, read_f64_le(r)?))
}

fn read_bool(r: &mut dyn Read, what: &str) -> Result<bool, CheckpointError> {
    match read_u8(r)? {
        0 => Ok(false),
        1 => Ok(true),
        v => Err(malformed(format!("invalid {what} flag: {v}"))),
    }
}

fn read_u32_vec(r: &mut dyn Read) -> Result<Vec<u32>, CheckpointError> {
    let n = read_u32_le(r)? as usize;
    let mut out = Vec::with_capacity(n.min(MAX_PREALLOC));
    for _ in 0..n {
        out.push(read_u32_le(r)?);
    }
    Ok(out)
}

fn malformed(detail: String) -> CheckpointError {
    CheckpointError::Malformed { detail }
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the checkpoint header (magic, version, config hash).
pub fn encode_header(w: &mut dyn Write, config_hash: u64) -> Result<(), CheckpointError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_u64_le(w, config_hash)
}

/// Decode and validate the header, returning the recorded config hash.
pub fn decode_header(r: &mut dyn Read) -> Result<u64, CheckpointError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CheckpointError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(CheckpointError::UnsupportedVersion { found: version });
    }
    read_u64_le(r)
}

// ── State encode/decode ─────────────────────────────────────────

/// Encode the full simulation state.
pub fn encode_state(w: &mut dyn Write, state: &SimulationState) -> Result<(), CheckpointError> {
    write_u64_le(w, state.step.0)?;
    write_f64_le(w, state.time)?;
    write_u64_le(w, state.next_tracer_id)?;
    write_count(w, state.blocks.len())?;
    for block in &state.blocks {
        encode_block(w, block)?;
    }
    Ok(())
}

/// Decode a state written by [`encode_state`].
pub fn decode_state(r: &mut dyn Read) -> Result<SimulationState, CheckpointError> {
    let step = StepId(read_u64_le(r)?);
    let time = read_f64_le(r)?;
    let next_tracer_id = read_u64_le(r)?;
    let n = read_u32_le(r)? as usize;
    let mut blocks = Vec::with_capacity(n.min(MAX_PREALLOC));
    for _ in 0..n {
        blocks.push(decode_block(r)?);
    }
    Ok(SimulationState {
        step,
        time,
        next_tracer_id,
        blocks,
    })
}

fn encode_block(w: &mut dyn Write, block: &BlockState) -> Result<(), CheckpointError> {
    encode_layout(w, &block.tracers)?;
    write_count(w, block.tracer_slots.len())?;
    for (slot, tracer) in &block.tracer_slots {
        write_u32_le(w, *slot)?;
        encode_tracer(w, tracer)?;
    }
    encode_layout(w, &block.sources)?;
    write_count(w, block.source_slots.len())?;
    for (slot, id, stats) in &block.source_slots {
        write_u32_le(w, *slot)?;
        write_u32_le(w, id.0)?;
        write_u64_le(w, stats.particles_emitted)?;
        write_f64_le(w, stats.carry)?;
        write_u32_le(w, stats.stencil_cursor)?;
    }
    Ok(())
}

fn decode_block(r: &mut dyn Read) -> Result<BlockState, CheckpointError> {
    let tracers = decode_layout(r)?;
    let n = read_u32_le(r)? as usize;
    let mut tracer_slots = Vec::with_capacity(n.min(MAX_PREALLOC));
    for _ in 0..n {
        let slot = read_u32_le(r)?;
        tracer_slots.push((slot, decode_tracer(r)?));
    }
    let sources = decode_layout(r)?;
    let n = read_u32_le(r)? as usize;
    let mut source_slots = Vec::with_capacity(n.min(MAX_PREALLOC));
    for _ in 0..n {
        let slot = read_u32_le(r)?;
        let id = SourceId(read_u32_le(r)?);
        let stats = SourceStats {
            particles_emitted: read_u64_le(r)?,
            carry: read_f64_le(r)?,
            stencil_cursor: read_u32_le(r)?,
        };
        source_slots.push((slot, id, stats));
    }
    Ok(BlockState {
        tracers,
        tracer_slots,
        sources,
        source_slots,
    })
}

fn encode_layout(w: &mut dyn Write, layout: &ContainerLayout) -> Result<(), CheckpointError> {
    write_count(w, layout.generations.len())?;
    for &g in &layout.generations {
        write_u32_le(w, g)?;
    }
    write_count(w, layout.free_list.len())?;
    for &i in &layout.free_list {
        write_u32_le(w, i)?;
    }
    Ok(())
}

fn decode_layout(r: &mut dyn Read) -> Result<ContainerLayout, CheckpointError> {
    Ok(ContainerLayout {
        generations: read_u32_vec(r)?,
        free_list: read_u32_vec(r)?,
    })
}

// ── Tracer encode/decode ────────────────────────────────────────

const VARIANT_GENERIC: u8 = 0;
const VARIANT_PAPER: u8 = 1;
const VARIANT_PLASTIC: u8 = 2;

/// Encode one tracer: ids, base state, then the tagged variant.
pub fn encode_tracer(w: &mut dyn Write, tracer: &Tracer) -> Result<(), CheckpointError> {
    let state = tracer.state();
    write_u64_le(w, tracer.id().0)?;
    write_u32_le(w, tracer.source().0)?;
    write_point(w, state.position)?;
    write_point(w, state.velocity)?;
    write_f64_le(w, state.age)?;
    write_u8(w, state.status.tag())?;
    match tracer.variant() {
        TracerVariant::Generic => write_u8(w, VARIANT_GENERIC),
        TracerVariant::Paper(p) => {
            write_u8(w, VARIANT_PAPER)?;
            write_u8(w, p.particulate as u8)?;
            write_f64_le(w, p.density)?;
            write_f64_le(w, p.radius)?;
            write_f64_le(w, p.degradation_rate)
        }
        TracerVariant::Plastic(p) => {
            write_u8(w, VARIANT_PLASTIC)?;
            write_u8(w, p.particulate as u8)?;
            write_f64_le(w, p.density)?;
            write_f64_le(w, p.radius)?;
            write_f64_le(w, p.degradation_rate)?;
            write_u8(w, p.polymer.tag())
        }
    }
}

/// Decode a tracer written by [`encode_tracer`].
pub fn decode_tracer(r: &mut dyn Read) -> Result<Tracer, CheckpointError> {
    let id = TracerId(read_u64_le(r)?);
    let source = SourceId(read_u32_le(r)?);
    let position = read_point(r)?;
    let velocity = read_point(r)?;
    let age = read_f64_le(r)?;
    let tag = read_u8(r)?;
    let status = TracerStatus::from_tag(tag)
        .ok_or_else(|| malformed(format!("tracer {id}: unknown status tag {tag}")))?;
    let variant = match read_u8(r)? {
        VARIANT_GENERIC => TracerVariant::Generic,
        VARIANT_PAPER => TracerVariant::Paper(PaperParams {
            particulate: read_bool(r, "particulate")?,
            density: read_f64_le(r)?,
            radius: read_f64_le(r)?,
            degradation_rate: read_f64_le(r)?,
        }),
        VARIANT_PLASTIC => {
            let particulate = read_bool(r, "particulate")?;
            let density = read_f64_le(r)?;
            let radius = read_f64_le(r)?;
            let degradation_rate = read_f64_le(r)?;
            let tag = read_u8(r)?;
            let polymer = Polymer::from_tag(tag)
                .ok_or_else(|| malformed(format!("tracer {id}: unknown polymer tag {tag}")))?;
            TracerVariant::Plastic(PlasticParams {
                particulate,
                density,
                radius,
                degradation_rate,
                polymer,
            })
        }
        other => return Err(malformed(format!("tracer {id}: unknown variant tag {other}"))),
    };
    Ok(Tracer::from_parts(
        id,
        source,
        TracerState {
            position,
            velocity,
            age,
            status,
        },
        variant,
    ))
}
