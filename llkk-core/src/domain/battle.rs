use serde::{Deserialize, Serialize};

use super::ids::RatingKey;
use super::submission::Month;

/// One pairwise comparison inside a cohort. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub lab_a: String,
    pub lab_b: String,
    pub parameter: String,
    pub level: String,
    pub month: Month,
    pub cv_a: Option<f64>,
    pub cv_b: Option<f64>,
    pub ratio_a: Option<f64>,
    pub ratio_b: Option<f64>,
    pub cv_score_a: f64,
    pub cv_score_b: f64,
    pub bonus_a: f64,
    pub bonus_b: f64,
    pub penalty_a: f64,
    pub penalty_b: f64,
    /// CV score + bonuses - penalties.
    pub outcome_score_a: f64,
    pub outcome_score_b: f64,
    /// Elo result for side A: 1 win, 0.5 draw, 0 loss.
    pub elo_outcome_a: f64,
    pub previous_rating_a: f64,
    pub previous_rating_b: f64,
    pub new_rating_a: f64,
    pub new_rating_b: f64,
}

impl BattleRecord {
    pub fn involves(&self, lab: &str) -> bool {
        self.lab_a == lab || self.lab_b == lab
    }

    /// Winning lab, or `None` for a draw.
    pub fn winner(&self) -> Option<&str> {
        if self.elo_outcome_a > 0.5 {
            Some(&self.lab_a)
        } else if self.elo_outcome_a < 0.5 {
            Some(&self.lab_b)
        } else {
            None
        }
    }

    pub fn rating_delta_a(&self) -> f64 {
        self.new_rating_a - self.previous_rating_a
    }

    pub fn rating_delta_b(&self) -> f64 {
        self.new_rating_b - self.previous_rating_b
    }
}

/// Rating of one key after a cohort was processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionEntry {
    pub lab: String,
    pub parameter: String,
    pub level: String,
    pub month: Month,
    pub rating: f64,
}

impl ProgressionEntry {
    pub fn key(&self) -> RatingKey {
        RatingKey::new(&self.lab, &self.parameter, &self.level)
    }
}

/// An expected (lab, parameter, level, month) slot with no submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingSlot {
    pub lab: String,
    pub parameter: String,
    pub level: String,
    pub month: Month,
    pub penalty: f64,
    pub rating_after: f64,
}
