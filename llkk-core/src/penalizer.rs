//! Missing-submission penalizer.
//!
//! Every (lab, parameter, level, month) in the expected grid that has no
//! submission costs the lab a fixed amount on RatingKey(lab, parameter,
//! level). There is no opponent, so no battle is recorded; the penalized
//! slots are returned for reporting instead.

use std::collections::{BTreeSet, HashSet};

use crate::domain::{MissingSlot, Month, RatingKey, SubmissionRecord};
use crate::ledger::RatingLedger;

/// The slots a run expects to see filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedGrid {
    pub labs: BTreeSet<String>,
    pub parameters: BTreeSet<String>,
    pub levels: BTreeSet<String>,
    pub months: BTreeSet<Month>,
}

impl ExpectedGrid {
    /// Every lab, parameter, level and month that appears in the batch.
    pub fn observed(submissions: &[SubmissionRecord]) -> Self {
        let mut grid = Self::default();
        for sub in submissions {
            grid.labs.insert(sub.lab.clone());
            grid.parameters.insert(sub.parameter.clone());
            grid.levels.insert(sub.level.clone());
            grid.months.insert(sub.month.clone());
        }
        grid
    }

    /// Replace the parameter axis with a fixed panel.
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Size of the Cartesian product.
    pub fn len(&self) -> usize {
        self.labs.len() * self.parameters.len() * self.levels.len() * self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All expected slots in (lab, parameter, level, month) order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &str, &str, &Month)> {
        self.labs.iter().flat_map(move |lab| {
            self.parameters.iter().flat_map(move |param| {
                self.levels.iter().flat_map(move |level| {
                    self.months
                        .iter()
                        .map(move |month| (lab.as_str(), param.as_str(), level.as_str(), month))
                })
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissingSubmissionPenalizer {
    penalty: f64,
}

impl MissingSubmissionPenalizer {
    pub fn new(penalty: f64) -> Self {
        Self { penalty }
    }

    /// Deduct the penalty for every expected slot without a submission.
    pub fn penalize(
        &self,
        submissions: &[SubmissionRecord],
        grid: &ExpectedGrid,
        ledger: &mut RatingLedger,
    ) -> Vec<MissingSlot> {
        let present: HashSet<(&str, &str, &str, &Month)> =
            submissions.iter().map(SubmissionRecord::slot).collect();

        let mut missing = Vec::new();
        for slot in grid.slots() {
            if present.contains(&slot) {
                continue;
            }
            let (lab, parameter, level, month) = slot;
            let key = RatingKey::new(lab, parameter, level);
            let rating_after = ledger.adjust(&key, -self.penalty);
            missing.push(MissingSlot {
                lab: lab.to_string(),
                parameter: parameter.to_string(),
                level: level.to_string(),
                month: month.clone(),
                penalty: self.penalty,
                rating_after,
            });
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(lab: &str, param: &str, month: &str) -> SubmissionRecord {
        SubmissionRecord {
            lab: lab.into(),
            parameter: param.into(),
            level: "L1".into(),
            month: Month::from(month),
            cv: Some(1.0),
            ratio: Some(1.0),
            sample_count: 20,
            working_days: 20,
        }
    }

    #[test]
    fn observed_grid_is_cartesian_product() {
        let subs = vec![sub("Lab_A", "Glucose", "Jan"), sub("Lab_B", "Urea", "Feb")];
        let grid = ExpectedGrid::observed(&subs);
        assert_eq!(grid.len(), 2 * 2 * 1 * 2);
        assert_eq!(grid.slots().count(), 8);
    }

    #[test]
    fn absent_slot_costs_exactly_the_penalty() {
        let subs = vec![sub("Lab_A", "Glucose", "Jan"), sub("Lab_B", "Glucose", "Jan")];
        let grid = ExpectedGrid::observed(&subs).with_parameters(["Glucose", "Creatinine"]);
        let mut ledger = RatingLedger::new(1500.0);

        let missing = MissingSubmissionPenalizer::new(10.0).penalize(&subs, &grid, &mut ledger);

        assert_eq!(missing.len(), 2);
        for slot in &missing {
            assert_eq!(slot.parameter, "Creatinine");
            assert_eq!(slot.rating_after, 1490.0);
        }
        assert_eq!(ledger.peek(&RatingKey::new("Lab_A", "Glucose", "L1")), None);
    }

    #[test]
    fn penalty_accumulates_per_missing_month() {
        let subs = vec![sub("Lab_A", "Glucose", "Jan"), sub("Lab_A", "Glucose", "Feb"), sub("Lab_B", "Glucose", "Mar")];
        let grid = ExpectedGrid::observed(&subs);
        let mut ledger = RatingLedger::new(1500.0);

        let missing = MissingSubmissionPenalizer::new(10.0).penalize(&subs, &grid, &mut ledger);

        // Lab_A misses Mar; Lab_B misses Jan and Feb.
        assert_eq!(missing.len(), 3);
        assert_eq!(ledger.peek(&RatingKey::new("Lab_A", "Glucose", "L1")), Some(1490.0));
        assert_eq!(ledger.peek(&RatingKey::new("Lab_B", "Glucose", "L1")), Some(1480.0));
        let months: Vec<&str> = missing.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["Mar", "Jan", "Feb"]);
    }

    #[test]
    fn complete_grid_penalizes_nothing() {
        let subs = vec![sub("Lab_A", "Glucose", "Jan"), sub("Lab_B", "Glucose", "Jan")];
        let grid = ExpectedGrid::observed(&subs);
        let mut ledger = RatingLedger::new(1500.0);
        assert!(MissingSubmissionPenalizer::new(10.0)
            .penalize(&subs, &grid, &mut ledger)
            .is_empty());
        assert!(ledger.is_empty());
    }
}
