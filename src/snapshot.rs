//! Per-iteration snapshot persistence.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot gap must be at least 1")]
    ZeroGap,
}

/// Trainer state after an iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CemSnapshot {
    pub itr: usize,
    /// Parameters committed to the live policy.
    pub policy_params: Vec<f64>,
    pub cur_mean: Vec<f64>,
    pub cur_std: Vec<f64>,
}

pub trait Snapshotter: Send {
    fn save_itr_params(&mut self, itr: usize, snapshot: &CemSnapshot) -> Result<(), SnapshotError>;
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSnapshotter;

impl Snapshotter for NoopSnapshotter {
    fn save_itr_params(&mut self, _itr: usize, _snapshot: &CemSnapshot) -> Result<(), SnapshotError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMode {
    /// `itr_<n>.json` for every iteration.
    All,
    /// `params.json`, overwritten each iteration.
    Last,
    /// `itr_<n>.json` for every iteration divisible by the gap.
    Gap(usize),
    None,
}

/// Writes snapshots as pretty-printed JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonSnapshotter {
    dir: PathBuf,
    mode: SnapshotMode,
}

impl JsonSnapshotter {
    /// Creates `dir` if it does not exist.
    pub fn new(dir: impl Into<PathBuf>, mode: SnapshotMode) -> Result<Self, SnapshotError> {
        if mode == SnapshotMode::Gap(0) {
            return Err(SnapshotError::ZeroGap);
        }
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, mode })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the snapshot for `itr` goes, if this mode keeps it at all.
    pub fn path_for(&self, itr: usize) -> Option<PathBuf> {
        match self.mode {
            SnapshotMode::All => Some(self.dir.join(format!("itr_{itr}.json"))),
            SnapshotMode::Last => Some(self.dir.join("params.json")),
            SnapshotMode::Gap(gap) if itr % gap == 0 => {
                Some(self.dir.join(format!("itr_{itr}.json")))
            }
            SnapshotMode::Gap(_) | SnapshotMode::None => None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<CemSnapshot, SnapshotError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Snapshotter for JsonSnapshotter {
    fn save_itr_params(&mut self, itr: usize, snapshot: &CemSnapshot) -> Result<(), SnapshotError> {
        let Some(path) = self.path_for(itr) else {
            return Ok(());
        };
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, snapshot)?;
        writer.flush()?;
        tracing::debug!(itr, path = %path.display(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("ferrum-cem-{}", uuid::Uuid::new_v4()))
    }

    fn snapshot(itr: usize) -> CemSnapshot {
        CemSnapshot {
            itr,
            policy_params: vec![itr as f64, 1.0],
            cur_mean: vec![0.5, -0.5],
            cur_std: vec![0.0, 2.0],
        }
    }

    #[test]
    fn all_mode_keeps_every_iteration() {
        let dir = scratch_dir();
        let mut snapshotter = JsonSnapshotter::new(&dir, SnapshotMode::All).unwrap();
        for itr in 0..3 {
            snapshotter.save_itr_params(itr, &snapshot(itr)).unwrap();
        }
        let loaded = JsonSnapshotter::load(dir.join("itr_1.json")).unwrap();
        assert_eq!(loaded, snapshot(1));
        assert!(dir.join("itr_2.json").exists());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn last_mode_overwrites() {
        let dir = scratch_dir();
        let mut snapshotter = JsonSnapshotter::new(&dir, SnapshotMode::Last).unwrap();
        snapshotter.save_itr_params(0, &snapshot(0)).unwrap();
        snapshotter.save_itr_params(1, &snapshot(1)).unwrap();
        assert_eq!(JsonSnapshotter::load(dir.join("params.json")).unwrap().itr, 1);
        assert!(!dir.join("itr_0.json").exists());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn gap_mode_skips_between_gaps() {
        let dir = scratch_dir();
        let snapshotter = JsonSnapshotter::new(&dir, SnapshotMode::Gap(5)).unwrap();
        assert!(snapshotter.path_for(0).is_some());
        assert!(snapshotter.path_for(3).is_none());
        assert!(snapshotter.path_for(10).is_some());
        assert!(matches!(
            JsonSnapshotter::new(&dir, SnapshotMode::Gap(0)),
            Err(SnapshotError::ZeroGap)
        ));
        fs::remove_dir_all(dir).unwrap();
    }
}
