//! Rating ledger: the only state that survives between simulation runs.
//!
//! Holds the current rating per `RatingKey` and the append-only progression
//! log. Keys are created lazily at the base rating. Storage is ordered
//! (`BTreeMap`) so iteration, persistence and fingerprints are deterministic.
//!
//! Single-writer: a run takes the ledger by value and hands back the updated one.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Month, ProgressionEntry, RatingKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingLedger {
    base_rating: f64,
    ratings: BTreeMap<RatingKey, f64>,
    progression: Vec<ProgressionEntry>,
}

impl RatingLedger {
    /// Empty ledger; unseen keys start at `base_rating`.
    pub fn new(base_rating: f64) -> Self {
        Self {
            base_rating,
            ratings: BTreeMap::new(),
            progression: Vec::new(),
        }
    }

    /// Carry forward a previously persisted state.
    pub fn from_parts(
        base_rating: f64,
        ratings: impl IntoIterator<Item = (RatingKey, f64)>,
        progression: Vec<ProgressionEntry>,
    ) -> Self {
        Self {
            base_rating,
            ratings: ratings.into_iter().collect(),
            progression,
        }
    }

    pub fn base_rating(&self) -> f64 {
        self.base_rating
    }

    /// Current rating, creating the key at the base rating if absent.
    pub fn get(&mut self, key: &RatingKey) -> f64 {
        let base = self.base_rating;
        *self.ratings.entry(key.clone()).or_insert(base)
    }

    /// Current rating without creating the key.
    pub fn peek(&self, key: &RatingKey) -> Option<f64> {
        self.ratings.get(key).copied()
    }

    pub fn set(&mut self, key: &RatingKey, rating: f64) {
        self.ratings.insert(key.clone(), rating);
    }

    /// Add `delta` to the key's rating (created at base first). Returns the new rating.
    pub fn adjust(&mut self, key: &RatingKey, delta: f64) -> f64 {
        let base = self.base_rating;
        let rating = self.ratings.entry(key.clone()).or_insert(base);
        *rating += delta;
        *rating
    }

    /// Append the key's current rating to the progression log for `month`.
    pub fn snapshot(&mut self, key: &RatingKey, month: &Month) -> ProgressionEntry {
        let entry = ProgressionEntry {
            lab: key.lab.clone(),
            parameter: key.parameter.clone(),
            level: key.level.clone(),
            month: month.clone(),
            rating: self.get(key),
        };
        self.progression.push(entry.clone());
        entry
    }

    pub fn ratings(&self) -> impl Iterator<Item = (&RatingKey, f64)> {
        self.ratings.iter().map(|(k, v)| (k, *v))
    }

    pub fn progression(&self) -> &[ProgressionEntry] {
        &self.progression
    }

    /// Progression entries for one key, in the order they were recorded.
    pub fn history_for<'a>(&'a self, key: &'a RatingKey) -> impl Iterator<Item = &'a ProgressionEntry> {
        self.progression
            .iter()
            .filter(move |e| e.lab == key.lab && e.parameter == key.parameter && e.level == key.level)
    }

    pub fn labs(&self) -> BTreeSet<&str> {
        self.ratings.keys().map(|k| k.lab.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Split into (ratings, progression) for persistence.
    pub fn into_parts(self) -> (BTreeMap<RatingKey, f64>, Vec<ProgressionEntry>) {
        (self.ratings, self.progression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(lab: &str) -> RatingKey {
        RatingKey::new(lab, "Glucose", "L1")
    }

    #[test]
    fn get_creates_at_base() {
        let mut ledger = RatingLedger::new(1000.0);
        assert_eq!(ledger.peek(&key("Lab_A")), None);
        assert_eq!(ledger.get(&key("Lab_A")), 1000.0);
        assert_eq!(ledger.peek(&key("Lab_A")), Some(1000.0));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn adjust_applies_delta_from_base() {
        let mut ledger = RatingLedger::new(1500.0);
        assert_eq!(ledger.adjust(&key("Lab_C"), -10.0), 1490.0);
        assert_eq!(ledger.adjust(&key("Lab_C"), -10.0), 1480.0);
    }

    #[test]
    fn keys_are_independent_per_test_type() {
        let mut ledger = RatingLedger::new(1500.0);
        ledger.set(&RatingKey::new("Lab_A", "Glucose", "L1"), 1520.0);
        assert_eq!(ledger.get(&RatingKey::new("Lab_A", "Creatinine", "L2")), 1500.0);
        assert_eq!(ledger.labs().len(), 1);
    }

    #[test]
    fn snapshot_appends_current_rating() {
        let mut ledger = RatingLedger::new(1500.0);
        ledger.set(&key("Lab_A"), 1508.0);
        let entry = ledger.snapshot(&key("Lab_A"), &Month::from("Jan"));
        assert_eq!(entry.rating, 1508.0);
        ledger.set(&key("Lab_A"), 1512.0);
        ledger.snapshot(&key("Lab_A"), &Month::from("Feb"));

        let history: Vec<f64> = ledger.history_for(&key("Lab_A")).map(|e| e.rating).collect();
        assert_eq!(history, vec![1508.0, 1512.0]);
    }

    #[test]
    fn carry_forward_round_trips_through_parts() {
        let mut ledger = RatingLedger::new(1500.0);
        ledger.set(&key("Lab_A"), 1490.0);
        ledger.snapshot(&key("Lab_A"), &Month::from("Jan"));
        let base = ledger.base_rating();
        let (ratings, progression) = ledger.clone().into_parts();

        let restored = RatingLedger::from_parts(base, ratings, progression);
        assert_eq!(restored, ledger);
    }
}
