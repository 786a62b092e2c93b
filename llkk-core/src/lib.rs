//! LLKK Core: battle resolution and rating engine.
//!
//! This crate turns monthly QC submissions into pairwise battles and ratings:
//! - Domain types (submissions, rating keys, battle records, progression)
//! - Structural validation of submission batches
//! - Cohort grouping by (parameter, level, month)
//! - Outcome rule: CV contest plus ratio/target bonuses and missing-data penalties
//! - Elo updater with configurable K-factor
//! - Missing-submission penalizer over the expected slot grid
//! - Rating ledger (carry-forward state + progression log)
//! - Battle simulator orchestrating one deterministic pass
//!
//! No I/O happens here; loading and persisting the ledger is the runner's job.

pub mod cohort;
pub mod config;
pub mod domain;
pub mod elo;
pub mod fingerprint;
pub mod ledger;
pub mod outcome;
pub mod penalizer;
pub mod simulator;
pub mod targets;
pub mod validate;

pub use config::{AdjustmentPolicy, OutcomeBasis, ScoringConfig};
pub use domain::{BattleRecord, CohortKey, MissingSlot, Month, ProgressionEntry, RatingKey, SubmissionRecord};
pub use fingerprint::RunFingerprint;
pub use ledger::RatingLedger;
pub use simulator::{BattleSimulator, SimulationError, SimulationOutcome};
pub use targets::QualityTargets;
pub use validate::{InvalidReason, InvalidRecord, ValidationError};
