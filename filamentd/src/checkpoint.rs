//! Weight snapshot persistence across daemon restarts.
//!
//! The checkpoint is a couple dozen floats; plain JSON in the data directory
//! is enough. Only the snapshot is persisted; optimizer momentum belongs to
//! the running process.

use std::fs;
use std::io;

use thiserror::Error;

use filament::network::WeightSnapshot;

use crate::paths::AppPaths;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io: {0}")]
    Io(#[from] io::Error),
    #[error("checkpoint parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Latest persisted weights, or `None` when no checkpoint exists yet.
pub fn load(paths: &AppPaths) -> Result<Option<WeightSnapshot>, CheckpointError> {
    let path = paths.checkpoint_file();
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

pub fn save(paths: &AppPaths, snapshot: &WeightSnapshot) -> Result<(), CheckpointError> {
    let raw = serde_json::to_string_pretty(snapshot)?;
    fs::write(paths.checkpoint_file(), raw)?;
    Ok(())
}
