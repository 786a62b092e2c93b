//! Quality targets: maximum acceptable CV per parameter.
//!
//! Built-in values follow the EFLM biological-variation desirable imprecision
//! for the LLKK chemistry panel. Deployments override or extend them via the
//! `[targets]` config table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter name → maximum acceptable CV (%).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityTargets {
    targets: BTreeMap<String, f64>,
}

impl QualityTargets {
    pub fn new(targets: BTreeMap<String, f64>) -> Self {
        Self { targets }
    }

    /// Desirable CV targets for the 16-analyte LLKK panel.
    pub fn eflm() -> Self {
        let table = [
            ("Albumin", 1.3),
            ("ALT", 4.7),
            ("AST", 4.8),
            ("Cholesterol", 2.7),
            ("CK", 7.3),
            ("Creatinine", 2.2),
            ("Direct Bilirubin", 10.0),
            ("GGT", 4.4),
            ("Glucose", 2.4),
            ("HDL Cholesterol", 2.8),
            ("LDH", 2.6),
            ("Potassium", 2.0),
            ("Sodium", 0.3),
            ("Total Protein", 1.3),
            ("Urea", 6.1),
            ("Uric Acid", 4.2),
        ];
        Self {
            targets: table
                .into_iter()
                .map(|(name, cv)| (name.to_string(), cv))
                .collect(),
        }
    }

    /// Exact name first, then an ASCII case-insensitive match.
    pub fn target_for(&self, parameter: &str) -> Option<f64> {
        self.targets.get(parameter).copied().or_else(|| {
            self.targets
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(parameter))
                .map(|(_, cv)| *cv)
        })
    }

    pub fn insert(&mut self, parameter: impl Into<String>, max_cv: f64) {
        self.targets.insert(parameter.into(), max_cv);
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn merged_with(mut self, other: &QualityTargets) -> Self {
        for (name, cv) in &other.targets {
            self.targets.insert(name.clone(), *cv);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.targets.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
