//! Checkpoint writing.

use std::io::Write;

use flotsam_engine::{Simulation, SimulationConfig, SimulationState};

use crate::codec::{encode_header, encode_state};
use crate::error::CheckpointError;
use crate::hash::config_hash;

/// Write a checkpoint of `sim` to `writer`.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`. The writer is flushed before
/// returning.
///
/// # Examples
///
/// ```
/// use flotsam_core::Point;
/// use flotsam_engine::{Simulation, SimulationConfig};
/// use flotsam_space::{BoundingBox, GridResolution};
///
/// let domain = BoundingBox::new(Point::ZERO, Point::xy(10.0, 10.0)).unwrap();
/// let config = SimulationConfig::new(domain, GridResolution::Cells { nx: 2, ny: 2 }, 1.0);
/// let sim = Simulation::new(config.clone()).unwrap();
///
/// let mut buf = Vec::new();
/// flotsam_checkpoint::save(&sim, &mut buf).unwrap();
/// let back = flotsam_checkpoint::restore(config, buf.as_slice()).unwrap();
/// assert_eq!(back.current_step(), sim.current_step());
/// ```
pub fn save<W: Write>(sim: &Simulation, writer: W) -> Result<(), CheckpointError> {
    let state = sim.state();
    write_state(sim.config(), &state, writer)?;
    tracing::debug!(
        step = state.step.0,
        blocks = state.blocks.len(),
        "checkpoint written"
    );
    Ok(())
}

/// Write a captured `state` taken under `config`.
pub fn write_state<W: Write>(
    config: &SimulationConfig,
    state: &SimulationState,
    mut writer: W,
) -> Result<(), CheckpointError> {
    encode_header(&mut writer, config_hash(config))?;
    encode_state(&mut writer, state)?;
    writer.flush()?;
    Ok(())
}
