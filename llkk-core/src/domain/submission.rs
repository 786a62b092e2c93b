use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Reporting period label ("Jan", "March", "2025-01").
///
/// Labels are kept verbatim but ordered chronologically when recognizable:
/// ISO `YYYY-MM`, full English month names and three-letter abbreviations
/// (case-insensitive). Bare month names sort before dated labels. Anything
/// unrecognized sorts after every recognized label, lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Month(pub String);

impl Month {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(year, month)` for recognized labels. Bare month names use year 0.
    pub fn calendar_position(&self) -> Option<(i32, u32)> {
        let label = self.0.trim();
        if let Some((year, month)) = label.split_once('-') {
            let year: i32 = year.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            return (1..=12).contains(&month).then_some((year, month));
        }
        let lower = label.to_ascii_lowercase();
        if lower.len() < 3 {
            return None;
        }
        MONTH_NAMES
            .iter()
            .position(|name| *name == lower || (lower.len() == 3 && name.starts_with(&lower)))
            .map(|idx| (0, idx as u32 + 1))
    }
}

impl Ord for Month {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.calendar_position(), other.calendar_position()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Month {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Month {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

/// One lab's monthly QC submission for a parameter/level.
///
/// `cv` and `ratio` are `None` when the lab did not report them; a missing
/// value is scored differently from a reported zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub lab: String,
    pub parameter: String,
    pub level: String,
    pub month: Month,
    pub cv: Option<f64>,
    pub ratio: Option<f64>,
    pub sample_count: u32,
    pub working_days: u32,
}

impl SubmissionRecord {
    /// Identity tuple: a lab reports at most once per slot.
    pub fn slot(&self) -> (&str, &str, &str, &Month) {
        (&self.lab, &self.parameter, &self.level, &self.month)
    }

    pub fn has_missing_metric(&self) -> bool {
        self.cv.is_none() || self.ratio.is_none()
    }

    /// QC runs per working day, rounded to two decimals. `None` without working days.
    pub fn derived_ratio(&self) -> Option<f64> {
        (self.working_days > 0).then(|| {
            let raw = self.sample_count as f64 / self.working_days as f64;
            (raw * 100.0).round() / 100.0
        })
    }
}
