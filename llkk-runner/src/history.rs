//! Run history: JSONL append-only log of completed simulations.
//!
//! One JSON object per line. Appending never rewrites earlier lines, so a
//! torn write can only damage the last entry, and `read_all` skips it.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use llkk_core::RunFingerprint;

pub const HISTORY_FILE: &str = "history.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub fingerprint: RunFingerprint,
    pub submissions: usize,
    pub battles: usize,
    pub missing_slots: usize,
    pub labs: usize,
    /// Top-ranked lab, if any lab was rated.
    pub leader: Option<String>,
    pub leader_rating: Option<f64>,
    /// True when the run ignored saved state.
    #[serde(default)]
    pub fresh: bool,
}

pub struct RunHistory {
    path: PathBuf,
}

impl RunHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(HISTORY_FILE))
    }

    pub fn append(&self, entry: &RunSummary) -> io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;
        file.flush()
    }

    /// All readable entries, oldest first.
    pub fn read_all(&self) -> io::Result<Vec<RunSummary>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = io::BufReader::new(fs::File::open(&self.path)?);
        let mut entries = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RunSummary>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = i + 1, error = %e, "skipping malformed history line"),
            }
        }
        Ok(entries)
    }

    pub fn latest(&self) -> io::Result<Option<RunSummary>> {
        Ok(self.read_all()?.pop())
    }

    pub fn clear(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
