//! LLKK Runner: everything around the battle engine that touches disk.
//!
//! This crate builds on `llkk-core` to provide:
//! - Arena configuration from TOML
//! - Submission ingestion from uploaded CSV sheets
//! - Persisted rating state with atomic whole-state replace
//! - Lab leaderboard with min ranking and medals
//! - CSV/JSON export of battles, leaderboard and missing slots
//! - JSONL run history
//! - Seeded sample data for demos

pub mod config;
pub mod export;
pub mod history;
pub mod ingest;
pub mod leaderboard;
pub mod runner;
pub mod sample_data;
pub mod store;

pub use config::{ArenaConfig, ConfigError, ExpectedConfig, LeaderboardConfig};
pub use history::{RunHistory, RunSummary};
pub use ingest::{read_submissions, read_submissions_file, DroppedRow, IngestError, IngestReport};
pub use leaderboard::{aggregate, LeaderboardEntry, Medal, RatingAggregation};
pub use runner::{
    load_leaderboard, load_progression, reset_state, run_batch, run_simulation, PersistedRun,
    ProgressionFilter, RunError, RunOptions, RunReport,
};
pub use sample_data::SamplePlan;
pub use store::{LedgerStore, StoreError};
