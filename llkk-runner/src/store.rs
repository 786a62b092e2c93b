//! On-disk rating state.
//!
//! A state directory holds two CSV tables:
//! - `ratings.csv`: `lab,parameter,level,rating`
//! - `progression.csv`: `lab,parameter,level,month,rating`
//!
//! The whole ledger is replaced on save. Both tables are written to `.tmp`
//! files first and renamed into place only once every write succeeded. The
//! previous progression table is held as `.bak` until ratings are in place
//! and restored if the ratings rename fails, so a failed save leaves the
//! previous state on disk and no stray temp files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use llkk_core::{Month, ProgressionEntry, RatingKey, RatingLedger};

pub const RATINGS_FILE: &str = "ratings.csv";
pub const PROGRESSION_FILE: &str = "progression.csv";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state I/O at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("state CSV at {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("corrupt state in {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> StoreError + '_ {
    move |source| StoreError::Csv {
        path: path.display().to_string(),
        source,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RatingRow {
    lab: String,
    parameter: String,
    level: String,
    rating: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProgressionRow {
    lab: String,
    parameter: String,
    level: String,
    month: String,
    rating: f64,
}

#[derive(Debug, Clone)]
pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ratings_path(&self) -> PathBuf {
        self.dir.join(RATINGS_FILE)
    }

    pub fn progression_path(&self) -> PathBuf {
        self.dir.join(PROGRESSION_FILE)
    }

    pub fn exists(&self) -> bool {
        self.ratings_path().exists()
    }

    /// Load the persisted ledger, or an empty one at `base_rating` if no
    /// state has been saved yet.
    pub fn load(&self, base_rating: f64) -> Result<RatingLedger, StoreError> {
        let ratings_path = self.ratings_path();
        if !ratings_path.exists() {
            debug!(dir = %self.dir.display(), "no saved ratings, starting fresh");
            return Ok(RatingLedger::new(base_rating));
        }

        let ratings = read_rows::<RatingRow>(&ratings_path)?
            .into_iter()
            .map(|row| {
                check_finite(&ratings_path, row.rating)?;
                Ok((RatingKey::new(row.lab, row.parameter, row.level), row.rating))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let progression_path = self.progression_path();
        let progression = if progression_path.exists() {
            read_rows::<ProgressionRow>(&progression_path)?
                .into_iter()
                .map(|row| {
                    check_finite(&progression_path, row.rating)?;
                    Ok(ProgressionEntry {
                        lab: row.lab,
                        parameter: row.parameter,
                        level: row.level,
                        month: Month::new(row.month),
                        rating: row.rating,
                    })
                })
                .collect::<Result<Vec<_>, StoreError>>()?
        } else {
            Vec::new()
        };

        info!(
            keys = ratings.len(),
            progression = progression.len(),
            "loaded rating state"
        );
        Ok(RatingLedger::from_parts(base_rating, ratings, progression))
    }

    /// Replace the persisted ledger.
    pub fn save(&self, ledger: &RatingLedger) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let ratings_path = self.ratings_path();
        let progression_path = self.progression_path();
        let ratings_tmp = ratings_path.with_extension("csv.tmp");
        let progression_tmp = progression_path.with_extension("csv.tmp");

        let staged = write_rows(
            &ratings_tmp,
            ledger.ratings().map(|(key, rating)| RatingRow {
                lab: key.lab.clone(),
                parameter: key.parameter.clone(),
                level: key.level.clone(),
                rating,
            }),
        )
        .and_then(|_| {
            write_rows(
                &progression_tmp,
                ledger.progression().iter().map(|e| ProgressionRow {
                    lab: e.lab.clone(),
                    parameter: e.parameter.clone(),
                    level: e.level.clone(),
                    month: e.month.as_str().to_string(),
                    rating: e.rating,
                }),
            )
        });
        if let Err(e) = staged {
            let _ = fs::remove_file(&ratings_tmp);
            let _ = fs::remove_file(&progression_tmp);
            return Err(e);
        }

        let backup = progression_path.with_extension("csv.bak");
        let had_progression = progression_path.exists();
        if had_progression {
            if let Err(e) = fs::rename(&progression_path, &backup) {
                let _ = fs::remove_file(&ratings_tmp);
                let _ = fs::remove_file(&progression_tmp);
                return Err(io_err(&progression_path)(e));
            }
        }

        let swapped = fs::rename(&progression_tmp, &progression_path)
            .map_err(io_err(&progression_path))
            .and_then(|_| fs::rename(&ratings_tmp, &ratings_path).map_err(io_err(&ratings_path)));
        if let Err(e) = swapped {
            warn!(dir = %self.dir.display(), error = %e, "save failed, restoring previous state");
            let _ = fs::remove_file(&ratings_tmp);
            let _ = fs::remove_file(&progression_tmp);
            if had_progression {
                let _ = fs::rename(&backup, &progression_path);
            } else {
                let _ = fs::remove_file(&progression_path);
            }
            return Err(e);
        }
        if had_progression {
            fs::remove_file(&backup).map_err(io_err(&backup))?;
        }

        info!(
            dir = %self.dir.display(),
            keys = ledger.len(),
            progression = ledger.progression().len(),
            "saved rating state"
        );
        Ok(())
    }

    /// Delete persisted ratings and progression. Returns how many files were
    /// removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for path in [self.ratings_path(), self.progression_path()] {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(&path)(e)),
            }
        }
        info!(dir = %self.dir.display(), removed, "cleared rating state");
        Ok(removed)
    }
}

fn check_finite(path: &Path, rating: f64) -> Result<(), StoreError> {
    if rating.is_finite() {
        Ok(())
    } else {
        Err(StoreError::Corrupt {
            path: path.display().to_string(),
            reason: format!("non-finite rating {rating}"),
        })
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, StoreError> {
    let mut rdr = csv::Reader::from_path(path).map_err(csv_err(path))?;
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row.map_err(csv_err(path))?);
    }
    Ok(rows)
}

fn write_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err(path))?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err(path))?;
    }
    wtr.flush().map_err(io_err(path))?;
    Ok(())
}
