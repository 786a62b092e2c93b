use serde::{Deserialize, Serialize};
use std::fmt;

use super::submission::{Month, SubmissionRecord};

/// Identity under which a rating is tracked: one lab on one test type.
///
/// Field order defines the ledger's iteration order (lab, then parameter, then level).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RatingKey {
    pub lab: String,
    pub parameter: String,
    pub level: String,
}

impl RatingKey {
    pub fn new(lab: impl Into<String>, parameter: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            lab: lab.into(),
            parameter: parameter.into(),
            level: level.into(),
        }
    }

    pub fn for_submission(sub: &SubmissionRecord) -> Self {
        Self::new(&sub.lab, &sub.parameter, &sub.level)
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.lab, self.parameter, self.level)
    }
}

/// Comparison unit: submissions sharing parameter, level and month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CohortKey {
    pub parameter: String,
    pub level: String,
    pub month: Month,
}

impl CohortKey {
    pub fn for_submission(sub: &SubmissionRecord) -> Self {
        Self {
            parameter: sub.parameter.clone(),
            level: sub.level.clone(),
            month: sub.month.clone(),
        }
    }

    pub fn rating_key(&self, lab: &str) -> RatingKey {
        RatingKey::new(lab, &self.parameter, &self.level)
    }
}

impl fmt::Display for CohortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.parameter, self.level, self.month)
    }
}
