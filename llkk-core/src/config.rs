//! Scoring constants for a simulation pass.
//!
//! Every number the outcome rule, Elo updater and penalizer use lives here so
//! a run can be reproduced from its config alone. All fields default, so a
//! partial TOML/JSON section deserializes cleanly.

use serde::{Deserialize, Serialize};

/// Where per-match bonuses and penalties land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentPolicy {
    /// Bonuses/penalties only shape the outcome score (and through it the Elo
    /// result). Rating deltas per match stay zero-sum.
    #[default]
    ScoreOnly,
    /// After the Elo delta, `bonus - penalty` is also added to each side's raw
    /// rating as a separate additive step.
    Rating,
}

/// Which comparison decides the Elo result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeBasis {
    /// Compare the outcome scores (CV score + bonuses - penalties).
    #[default]
    FinalScore,
    /// Compare the CV contest scores only.
    CvContest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// CV differences strictly below this are draws.
    pub cv_draw_tolerance: f64,
    pub ratio_bonus_threshold: f64,
    pub ratio_bonus: f64,
    /// Granted when CV is at or below the parameter's quality target.
    pub target_bonus: f64,
    /// Per match, for a lab missing CV or Ratio.
    pub missing_data_penalty: f64,
    /// Per expected slot with no submission at all.
    pub missing_submission_penalty: f64,
    pub k_factor: f64,
    pub base_rating: f64,
    pub adjustment_policy: AdjustmentPolicy,
    pub outcome_basis: OutcomeBasis,
    pub penalize_missing_submissions: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cv_draw_tolerance: 0.1,
            ratio_bonus_threshold: 1.0,
            ratio_bonus: 5.0,
            target_bonus: 2.0,
            missing_data_penalty: 10.0,
            missing_submission_penalty: 10.0,
            k_factor: 16.0,
            base_rating: 1500.0,
            adjustment_policy: AdjustmentPolicy::default(),
            outcome_basis: OutcomeBasis::default(),
            penalize_missing_submissions: true,
        }
    }
}

impl ScoringConfig {
    /// Reject constants that would make ratings meaningless.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("cv_draw_tolerance", self.cv_draw_tolerance),
            ("ratio_bonus_threshold", self.ratio_bonus_threshold),
            ("ratio_bonus", self.ratio_bonus),
            ("target_bonus", self.target_bonus),
            ("missing_data_penalty", self.missing_data_penalty),
            ("missing_submission_penalty", self.missing_submission_penalty),
            ("k_factor", self.k_factor),
            ("base_rating", self.base_rating),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(format!("{name} must be finite, got {value}"));
            }
        }
        for (name, value) in &fields[..7] {
            if *value < 0.0 {
                return Err(format!("{name} must not be negative, got {value}"));
            }
        }
        if self.k_factor == 0.0 {
            return Err("k_factor must be positive".into());
        }
        Ok(())
    }
}
