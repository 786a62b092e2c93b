//! Arena configuration: a single TOML file.
//!
//! ```toml
//! [scoring]
//! k_factor = 16.0
//! adjustment_policy = "score_only"
//!
//! [leaderboard]
//! aggregation = "mean"
//!
//! [expected]
//! parameters = ["Glucose", "Creatinine"]
//!
//! [targets]
//! Glucose = 2.4
//! ```
//!
//! Every section is optional; an empty file yields the default arena rules.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use llkk_core::{BattleSimulator, QualityTargets, ScoringConfig};

use crate::leaderboard::RatingAggregation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub aggregation: RatingAggregation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedConfig {
    /// Fixed parameter panel every lab is expected to report. `None` means
    /// "whatever parameters appear in the batch".
    pub parameters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Start from an empty target table instead of the EFLM defaults.
    pub replace_default_targets: bool,
    pub scoring: ScoringConfig,
    pub leaderboard: LeaderboardConfig,
    pub expected: ExpectedConfig,
    /// Overrides layered on the built-in EFLM table.
    pub targets: BTreeMap<String, f64>,
}

impl ArenaConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate().map_err(ConfigError::Invalid)?;
        for (name, cv) in &self.targets {
            if !cv.is_finite() || *cv < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "target for '{name}' must be a non-negative number, got {cv}"
                )));
            }
        }
        if let Some(params) = &self.expected.parameters {
            if params.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::Invalid(
                    "expected.parameters contains an empty name".into(),
                ));
            }
        }
        Ok(())
    }

    /// The effective quality-target table.
    pub fn quality_targets(&self) -> QualityTargets {
        let base = if self.replace_default_targets {
            QualityTargets::default()
        } else {
            QualityTargets::eflm()
        };
        base.merged_with(&QualityTargets::new(self.targets.clone()))
    }

    pub fn simulator(&self) -> BattleSimulator {
        let sim = BattleSimulator::new(self.scoring.clone(), self.quality_targets());
        match &self.expected.parameters {
            Some(params) => sim.with_expected_parameters(params.clone()),
            None => sim,
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
