//! Structural validation of submissions before grouping.
//!
//! Missing CV/Ratio is a scoring case, not a defect. What is rejected:
//! empty identity fields, non-finite metrics, and two different records for
//! the same (lab, parameter, level, month) slot. Exact duplicates collapse.
//! All offending records are reported together.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::domain::SubmissionRecord;

/// Why a single record was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    MissingField(&'static str),
    NonFiniteMetric(&'static str),
    /// Same slot as the record at `first_index`, with different values.
    ConflictingDuplicate { first_index: usize },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing {field}"),
            Self::NonFiniteMetric(field) => write!(f, "{field} is not a finite number"),
            Self::ConflictingDuplicate { first_index } => {
                write!(f, "conflicts with record #{first_index} for the same slot")
            }
        }
    }
}

/// An offending record and its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRecord {
    pub index: usize,
    pub record: SubmissionRecord,
    pub reason: InvalidReason,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} invalid submission record(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<InvalidRecord>,
}

fn summarize(issues: &[InvalidRecord]) -> String {
    const SHOWN: usize = 5;
    let mut parts: Vec<String> = issues
        .iter()
        .take(SHOWN)
        .map(|i| format!("#{} ({}): {}", i.index, i.record.lab, i.reason))
        .collect();
    if issues.len() > SHOWN {
        parts.push(format!("and {} more", issues.len() - SHOWN));
    }
    parts.join("; ")
}

fn check_record(sub: &SubmissionRecord) -> Option<InvalidReason> {
    let identity = [
        ("lab", sub.lab.as_str()),
        ("parameter", sub.parameter.as_str()),
        ("level", sub.level.as_str()),
        ("month", sub.month.as_str()),
    ];
    if let Some((field, _)) = identity.iter().find(|(_, v)| v.trim().is_empty()) {
        return Some(InvalidReason::MissingField(*field));
    }
    if sub.cv.is_some_and(|v| !v.is_finite()) {
        return Some(InvalidReason::NonFiniteMetric("cv"));
    }
    if sub.ratio.is_some_and(|v| !v.is_finite()) {
        return Some(InvalidReason::NonFiniteMetric("ratio"));
    }
    None
}

/// Validate and canonicalize a submission batch.
///
/// On success returns the deduplicated records sorted by slot, so the result
/// does not depend on input order.
pub fn validate_submissions(
    records: Vec<SubmissionRecord>,
) -> Result<Vec<SubmissionRecord>, ValidationError> {
    let mut issues = Vec::new();
    // slot -> index of the first record seen for it
    let mut seen: BTreeMap<(String, String, String, String), usize> = BTreeMap::new();
    let mut accepted: Vec<(usize, SubmissionRecord)> = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if let Some(reason) = check_record(record) {
            issues.push(InvalidRecord {
                index,
                record: record.clone(),
                reason,
            });
            continue;
        }

        let slot = (
            record.lab.clone(),
            record.parameter.clone(),
            record.level.clone(),
            record.month.0.clone(),
        );
        match seen.get(&slot) {
            Some(&first_index) if records[first_index] == *record => {}
            Some(&first_index) => issues.push(InvalidRecord {
                index,
                record: record.clone(),
                reason: InvalidReason::ConflictingDuplicate { first_index },
            }),
            None => {
                seen.insert(slot, index);
                accepted.push((index, record.clone()));
            }
        }
    }

    if !issues.is_empty() {
        return Err(ValidationError { issues });
    }

    let mut out: Vec<SubmissionRecord> = accepted.into_iter().map(|(_, r)| r).collect();
    out.sort_by(|a, b| {
        (&a.lab, &a.parameter, &a.level, &a.month).cmp(&(&b.lab, &b.parameter, &b.level, &b.month))
    });
    Ok(out)
}
