//! Checkpoint reading and restore.

use std::io::Read;

use flotsam_engine::{Simulation, SimulationConfig, SimulationState};

use crate::codec::{decode_header, decode_state};
use crate::error::CheckpointError;
use crate::hash::config_hash;

/// Decode a checkpoint taken under `config` without building a
/// simulation.
///
/// Fails with [`CheckpointError::ConfigMismatch`] if the checkpoint was
/// written under a different configuration, and with
/// [`CheckpointError::Malformed`] if bytes remain after the state.
pub fn read_state<R: Read>(
    config: &SimulationConfig,
    mut reader: R,
) -> Result<SimulationState, CheckpointError> {
    let recorded = decode_header(&mut reader)?;
    let current = config_hash(config);
    if recorded != current {
        return Err(CheckpointError::ConfigMismatch { recorded, current });
    }
    let state = decode_state(&mut reader)?;

    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? != 0 {
        return Err(CheckpointError::Malformed {
            detail: "trailing bytes after state".into(),
        });
    }
    Ok(state)
}

/// Rebuild a simulation from a checkpoint taken under `config`.
pub fn restore<R: Read>(config: SimulationConfig, reader: R) -> Result<Simulation, CheckpointError> {
    let state = read_state(&config, reader)?;
    Ok(Simulation::from_state(config, state)?)
}
