//! Domain types for the LLKK battle arena

pub mod battle;
pub mod ids;
pub mod submission;

pub use battle::{BattleRecord, MissingSlot, ProgressionEntry};
pub use ids::{CohortKey, RatingKey};
pub use submission::{Month, SubmissionRecord};
