//! Cohort grouping: submissions that can be compared with each other.
//!
//! A cohort is every submission sharing (parameter, level, month). Cohorts
//! come out in key order (months chronological) and members in lab order, so
//! pair enumeration is reproducible regardless of input order.

use std::collections::BTreeMap;

use crate::domain::{CohortKey, SubmissionRecord};

#[derive(Debug, Clone)]
pub struct Cohort<'a> {
    pub key: CohortKey,
    members: Vec<&'a SubmissionRecord>,
}

impl<'a> Cohort<'a> {
    /// Members sorted by lab identifier.
    pub fn members(&self) -> &[&'a SubmissionRecord] {
        &self.members
    }

    pub fn labs(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.lab.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// At least two labs, so matches can be played.
    pub fn is_contested(&self) -> bool {
        self.members.len() >= 2
    }

    /// Every unordered pair once, `(a, b)` with `a.lab < b.lab`.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a SubmissionRecord, &'a SubmissionRecord)> + '_ {
        let members = &self.members;
        (0..members.len()).flat_map(move |i| ((i + 1)..members.len()).map(move |j| (members[i], members[j])))
    }

    /// Number of pairs `pairs()` yields: n(n-1)/2.
    pub fn pair_count(&self) -> usize {
        let n = self.members.len();
        n * n.saturating_sub(1) / 2
    }
}

/// Partition submissions into cohorts.
///
/// Assumes at most one record per lab per slot (see `validate_submissions`);
/// if a lab appears twice only its first record in lab order is kept.
pub fn group_cohorts(submissions: &[SubmissionRecord]) -> Vec<Cohort<'_>> {
    let mut groups: BTreeMap<CohortKey, Vec<&SubmissionRecord>> = BTreeMap::new();
    for sub in submissions {
        groups.entry(CohortKey::for_submission(sub)).or_default().push(sub);
    }

    groups
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| a.lab.cmp(&b.lab));
            members.dedup_by(|a, b| a.lab == b.lab);
            Cohort { key, members }
        })
        .collect()
}
