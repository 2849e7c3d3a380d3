//! Checkpoint log bookkeeping.
//!
//! Model weights are the oracle's business; this side only keeps the
//! append-only audit line per saved iteration under `logs/`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

/// Append-only log of saved checkpoints.
pub struct CheckpointLog {
    path: PathBuf,
}

impl CheckpointLog {
    /// Open (creating directories as needed) the log under `dir`.
    pub fn open(dir: &Path) -> Result<CheckpointLog> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating checkpoint directory {}", dir.display()))?;
        Ok(CheckpointLog {
            path: dir.join("checkpoints.log"),
        })
    }

    /// Record one saved iteration with a wall-clock timestamp.
    pub fn record(&self, iteration: usize) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        writeln!(
            file,
            "iteration {iteration} saved at {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )
        .with_context(|| format!("appending to {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
