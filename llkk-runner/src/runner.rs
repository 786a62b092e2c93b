//! Run orchestration: ingest, simulate, rank, persist.
//!
//! Persisted state is loaded fully before the simulation and replaced fully
//! after it. Nothing is written unless the run succeeded.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use llkk_core::{
    BattleRecord, MissingSlot, ProgressionEntry, RatingLedger, RunFingerprint, SimulationError,
    SubmissionRecord,
};

use crate::config::{ArenaConfig, ConfigError};
use crate::history::{RunHistory, RunSummary};
use crate::ingest::{self, DroppedRow, IngestError};
use crate::leaderboard::{self, LeaderboardEntry};
use crate::store::{LedgerStore, StoreError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("state error: {0}")]
    Store(#[from] StoreError),
    #[error("history error: {0}")]
    History(#[from] std::io::Error),
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub fingerprint: RunFingerprint,
    pub battles: Vec<BattleRecord>,
    pub missing: Vec<MissingSlot>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub ledger: RatingLedger,
    pub submissions: usize,
    pub cohorts_contested: usize,
    pub cohorts_uncontested: usize,
    pub dropped_rows: usize,
}

impl RunReport {
    pub fn summary(&self, fresh: bool) -> RunSummary {
        let leader = self.leaderboard.first();
        RunSummary {
            timestamp: Utc::now(),
            fingerprint: self.fingerprint.clone(),
            submissions: self.submissions,
            battles: self.battles.len(),
            missing_slots: self.missing.len(),
            labs: self.leaderboard.len(),
            leader: leader.map(|e| e.lab.clone()),
            leader_rating: leader.map(|e| e.final_rating),
            fresh,
        }
    }
}

/// Simulate a batch against a starting ledger. No I/O.
pub fn run_batch(
    config: &ArenaConfig,
    submissions: Vec<SubmissionRecord>,
    ledger: RatingLedger,
) -> Result<RunReport, RunError> {
    let sim = config.simulator();
    let outcome = sim.run(submissions, ledger)?;
    let fingerprint = outcome.fingerprint();
    let board = leaderboard::aggregate(
        &outcome.ledger,
        &outcome.battles,
        config.leaderboard.aggregation,
    );

    Ok(RunReport {
        fingerprint,
        submissions: outcome.submissions.len(),
        cohorts_contested: outcome.cohorts_contested,
        cohorts_uncontested: outcome.cohorts_uncontested,
        battles: outcome.battles,
        missing: outcome.missing,
        leaderboard: board,
        ledger: outcome.ledger,
        dropped_rows: 0,
    })
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub state_dir: PathBuf,
    /// Ignore saved ratings and start every key at the base rating.
    pub fresh: bool,
}

/// Output of a persisted run.
#[derive(Debug, Clone)]
pub struct PersistedRun {
    pub report: RunReport,
    pub dropped: Vec<DroppedRow>,
    pub summary: RunSummary,
}

pub fn run_simulation(config: &ArenaConfig, options: &RunOptions) -> Result<PersistedRun, RunError> {
    config.validate()?;

    let store = LedgerStore::new(&options.state_dir);
    let ledger = if options.fresh {
        RatingLedger::new(config.scoring.base_rating)
    } else {
        store.load(config.scoring.base_rating)?
    };

    let ingested = ingest::read_submissions_file(&options.input)?;
    let mut report = run_batch(config, ingested.records, ledger)?;
    report.dropped_rows = ingested.dropped.len();

    store.save(&report.ledger)?;
    let summary = report.summary(options.fresh);
    RunHistory::in_dir(&options.state_dir).append(&summary)?;

    info!(
        fingerprint = %report.fingerprint.short(),
        battles = report.battles.len(),
        missing = report.missing.len(),
        labs = report.leaderboard.len(),
        "run complete"
    );

    Ok(PersistedRun {
        report,
        dropped: ingested.dropped,
        summary,
    })
}

/// Leaderboard over persisted state without running a new batch.
///
/// Saved state holds ratings only, so `total_score` and the W/D/L tallies
/// are zero here. They are filled for the run that produced a `RunReport`.
pub fn load_leaderboard(
    config: &ArenaConfig,
    state_dir: &Path,
) -> Result<Vec<LeaderboardEntry>, RunError> {
    let ledger = LedgerStore::new(state_dir).load(config.scoring.base_rating)?;
    Ok(leaderboard::aggregate(
        &ledger,
        &[],
        config.leaderboard.aggregation,
    ))
}

/// Optional lab/parameter/level filter over the progression log.
#[derive(Debug, Clone, Default)]
pub struct ProgressionFilter {
    pub lab: Option<String>,
    pub parameter: Option<String>,
    pub level: Option<String>,
}

impl ProgressionFilter {
    pub fn matches(&self, entry: &ProgressionEntry) -> bool {
        let eq = |want: &Option<String>, have: &str| want.as_deref().map_or(true, |w| w == have);
        eq(&self.lab, &entry.lab) && eq(&self.parameter, &entry.parameter) && eq(&self.level, &entry.level)
    }
}

/// Persisted progression entries matching `filter`, in recorded order.
pub fn load_progression(
    config: &ArenaConfig,
    state_dir: &Path,
    filter: &ProgressionFilter,
) -> Result<Vec<ProgressionEntry>, RunError> {
    let ledger = LedgerStore::new(state_dir).load(config.scoring.base_rating)?;
    let (_, progression) = ledger.into_parts();
    Ok(progression.into_iter().filter(|e| filter.matches(e)).collect())
}

/// Remove persisted ratings, progression and history.
pub fn reset_state(state_dir: &Path) -> Result<usize, RunError> {
    let mut removed = LedgerStore::new(state_dir).clear()?;
    if RunHistory::in_dir(state_dir).clear()? {
        removed += 1;
    }
    Ok(removed)
}
