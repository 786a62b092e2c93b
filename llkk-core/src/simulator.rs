//! Battle simulator: one full pass over a submission batch.
//!
//! Order of work, per run:
//! 1. Validate and canonicalize submissions (rejects the whole batch on error).
//! 2. For each cohort in key order: make sure every member has a rating, play
//!    every pair (outcome rule, then Elo update, then the optional additive
//!    adjustment), then snapshot each member's rating into the progression log.
//! 3. Penalize expected-but-missing slots.
//!
//! The ledger is taken by value and returned inside the outcome. On error the
//! caller still holds nothing new, so a failed run cannot leave a
//! half-updated ledger behind.

use thiserror::Error;
use tracing::{debug, info};

use crate::cohort::group_cohorts;
use crate::config::{AdjustmentPolicy, ScoringConfig};
use crate::domain::{BattleRecord, MissingSlot, SubmissionRecord};
use crate::elo::EloUpdater;
use crate::fingerprint::RunFingerprint;
use crate::ledger::RatingLedger;
use crate::outcome::OutcomeRule;
use crate::penalizer::{ExpectedGrid, MissingSubmissionPenalizer};
use crate::targets::QualityTargets;
use crate::validate::{validate_submissions, ValidationError};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid scoring config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub battles: Vec<BattleRecord>,
    pub missing: Vec<MissingSlot>,
    pub ledger: RatingLedger,
    /// Canonical (validated, deduplicated, sorted) submissions the run used.
    pub submissions: Vec<SubmissionRecord>,
    pub cohorts_contested: usize,
    pub cohorts_uncontested: usize,
}

impl SimulationOutcome {
    pub fn fingerprint(&self) -> RunFingerprint {
        RunFingerprint::compute(&self.battles, &self.ledger)
    }
}

#[derive(Debug, Clone)]
pub struct BattleSimulator {
    config: ScoringConfig,
    targets: QualityTargets,
    expected_parameters: Option<Vec<String>>,
}

impl BattleSimulator {
    pub fn new(config: ScoringConfig, targets: QualityTargets) -> Self {
        Self {
            config,
            targets,
            expected_parameters: None,
        }
    }

    /// Expect every lab to report on this fixed panel, not just the observed parameters.
    pub fn with_expected_parameters(mut self, parameters: Vec<String>) -> Self {
        self.expected_parameters = Some(parameters);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn targets(&self) -> &QualityTargets {
        &self.targets
    }

    /// Fresh ledger at this simulator's base rating.
    pub fn empty_ledger(&self) -> RatingLedger {
        RatingLedger::new(self.config.base_rating)
    }

    pub fn expected_grid(&self, submissions: &[SubmissionRecord]) -> ExpectedGrid {
        let grid = ExpectedGrid::observed(submissions);
        match &self.expected_parameters {
            Some(params) => grid.with_parameters(params.iter().cloned()),
            None => grid,
        }
    }

    pub fn run(
        &self,
        submissions: Vec<SubmissionRecord>,
        mut ledger: RatingLedger,
    ) -> Result<SimulationOutcome, SimulationError> {
        self.config.validate().map_err(SimulationError::InvalidConfig)?;
        let submissions = validate_submissions(submissions)?;

        let rule = OutcomeRule::new(&self.config, &self.targets);
        let elo = EloUpdater::new(self.config.k_factor);
        let mut battles = Vec::new();
        let mut contested = 0;
        let mut uncontested = 0;

        for cohort in group_cohorts(&submissions) {
            let key = &cohort.key;
            for lab in cohort.labs() {
                ledger.get(&key.rating_key(lab));
            }

            if cohort.is_contested() {
                contested += 1;
            } else {
                uncontested += 1;
            }
            debug!(cohort = %key, labs = cohort.len(), matches = cohort.pair_count(), "processing cohort");

            for (sub_a, sub_b) in cohort.pairs() {
                let key_a = key.rating_key(&sub_a.lab);
                let key_b = key.rating_key(&sub_b.lab);
                let outcome = rule.evaluate(sub_a, sub_b, &key.parameter);
                let elo_outcome_a = outcome.elo_outcome_a(self.config.outcome_basis);

                let previous_a = ledger.get(&key_a);
                let previous_b = ledger.get(&key_b);
                let (mut new_a, mut new_b) = elo.update(previous_a, previous_b, elo_outcome_a);
                if self.config.adjustment_policy == AdjustmentPolicy::Rating {
                    new_a += outcome.a.adjustment();
                    new_b += outcome.b.adjustment();
                }
                ledger.set(&key_a, new_a);
                ledger.set(&key_b, new_b);

                battles.push(BattleRecord {
                    lab_a: sub_a.lab.clone(),
                    lab_b: sub_b.lab.clone(),
                    parameter: key.parameter.clone(),
                    level: key.level.clone(),
                    month: key.month.clone(),
                    cv_a: sub_a.cv,
                    cv_b: sub_b.cv,
                    ratio_a: sub_a.ratio,
                    ratio_b: sub_b.ratio,
                    cv_score_a: outcome.a.cv_score,
                    cv_score_b: outcome.b.cv_score,
                    bonus_a: outcome.a.bonus,
                    bonus_b: outcome.b.bonus,
                    penalty_a: outcome.a.penalty,
                    penalty_b: outcome.b.penalty,
                    outcome_score_a: outcome.a.outcome_score(),
                    outcome_score_b: outcome.b.outcome_score(),
                    elo_outcome_a,
                    previous_rating_a: previous_a,
                    previous_rating_b: previous_b,
                    new_rating_a: new_a,
                    new_rating_b: new_b,
                });
            }

            for lab in cohort.labs() {
                ledger.snapshot(&key.rating_key(lab), &key.month);
            }
        }

        let missing = if self.config.penalize_missing_submissions {
            let grid = self.expected_grid(&submissions);
            MissingSubmissionPenalizer::new(self.config.missing_submission_penalty)
                .penalize(&submissions, &grid, &mut ledger)
        } else {
            Vec::new()
        };

        info!(
            submissions = submissions.len(),
            cohorts = contested + uncontested,
            battles = battles.len(),
            missing = missing.len(),
            rated_keys = ledger.len(),
            "simulation pass complete"
        );

        Ok(SimulationOutcome {
            battles,
            missing,
            ledger,
            submissions,
            cohorts_contested: contested,
            cohorts_uncontested: uncontested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutcomeBasis;
    use crate::domain::{Month, RatingKey};

    fn sub(lab: &str, param: &str, month: &str, cv: Option<f64>, ratio: Option<f64>) -> SubmissionRecord {
        SubmissionRecord {
            lab: lab.into(),
            parameter: param.into(),
            level: "L1".into(),
            month: Month::from(month),
            cv,
            ratio,
            sample_count: 20,
            working_days: 22,
        }
    }

    fn simulator(config: ScoringConfig) -> BattleSimulator {
        BattleSimulator::new(config, QualityTargets::eflm())
    }

    #[test]
    fn worked_example_lab_a_beats_lab_b() {
        let sim = simulator(ScoringConfig::default());
        let subs = vec![
            sub("Lab_A", "Glucose", "Jan", Some(1.2), Some(0.9)),
            sub("Lab_B", "Glucose", "Jan", Some(1.4), Some(0.9)),
        ];
        let out = sim.run(subs, sim.empty_ledger()).unwrap();

        assert_eq!(out.battles.len(), 1);
        let b = &out.battles[0];
        assert_eq!((b.cv_score_a, b.cv_score_b), (1.0, 0.0));
        assert_eq!(b.new_rating_a, 1508.0);
        assert_eq!(b.new_rating_b, 1492.0);
        assert_eq!(out.ledger.peek(&RatingKey::new("Lab_A", "Glucose", "L1")), Some(1508.0));
        assert!(out.missing.is_empty());
    }

    #[test]
    fn single_lab_cohort_plays_no_battle_but_is_tracked() {
        let sim = simulator(ScoringConfig::default());
        let subs = vec![sub("Lab_C", "Creatinine", "Jan", None, None)];
        let out = sim.run(subs, sim.empty_ledger()).unwrap();

        assert!(out.battles.is_empty());
        assert_eq!(out.cohorts_uncontested, 1);
        assert_eq!(out.ledger.progression().len(), 1);
        assert_eq!(out.ledger.peek(&RatingKey::new("Lab_C", "Creatinine", "L1")), Some(1500.0));
    }

    #[test]
    fn absent_lab_loses_penalty_without_battle() {
        let sim = simulator(ScoringConfig::default());
        let subs = vec![
            sub("Lab_A", "Glucose", "Jan", Some(1.2), Some(1.0)),
            sub("Lab_B", "Glucose", "Jan", Some(1.4), Some(1.0)),
            sub("Lab_A", "Creatinine", "Jan", Some(2.0), Some(1.0)),
            sub("Lab_B", "Creatinine", "Jan", Some(2.0), Some(1.0)),
            sub("Lab_C", "Urea", "Jan", Some(3.0), Some(1.0)),
        ];
        let out = sim.run(subs, sim.empty_ledger()).unwrap();

        let lab_c_creatinine = RatingKey::new("Lab_C", "Creatinine", "L1");
        assert_eq!(out.ledger.peek(&lab_c_creatinine), Some(1490.0));
        assert!(out.battles.iter().all(|b| !b.involves("Lab_C")));
        assert!(out
            .missing
            .iter()
            .any(|m| m.lab == "Lab_C" && m.parameter == "Creatinine"));
    }

    #[test]
    fn rating_policy_adds_adjustment_after_elo() {
        let config = ScoringConfig {
            adjustment_policy: AdjustmentPolicy::Rating,
            ..ScoringConfig::default()
        };
        let sim = simulator(config);
        let subs = vec![
            // A: wins CV, ratio bonus 5, target bonus 2 → +7
            sub("Lab_A", "Glucose", "Jan", Some(1.2), Some(1.1)),
            // B: missing ratio → penalty 10, target bonus 2 → -8
            sub("Lab_B", "Glucose", "Jan", Some(1.4), None),
        ];
        let out = sim.run(subs, sim.empty_ledger()).unwrap();
        let b = &out.battles[0];
        assert_eq!(b.new_rating_a, 1508.0 + 7.0);
        assert_eq!(b.new_rating_b, 1492.0 - 8.0);
    }

    #[test]
    fn score_only_policy_keeps_match_zero_sum() {
        let sim = simulator(ScoringConfig::default());
        let subs = vec![
            sub("Lab_A", "Glucose", "Jan", Some(1.2), Some(1.1)),
            sub("Lab_B", "Glucose", "Jan", Some(1.4), None),
        ];
        let out = sim.run(subs, sim.empty_ledger()).unwrap();
        let b = &out.battles[0];
        assert!((b.rating_delta_a() + b.rating_delta_b()).abs() < 1e-9);
    }

    #[test]
    fn final_score_can_overturn_cv_contest() {
        let subs = || {
            vec![
                sub("Lab_A", "Urea", "Jan", Some(3.0), None),
                sub("Lab_B", "Urea", "Jan", Some(9.0), Some(1.2)),
            ]
        };
        let by_score = simulator(ScoringConfig::default());
        let out = by_score.run(subs(), by_score.empty_ledger()).unwrap();
        assert_eq!(out.battles[0].winner(), Some("Lab_B"));

        let by_cv = simulator(ScoringConfig {
            outcome_basis: OutcomeBasis::CvContest,
            ..ScoringConfig::default()
        });
        let out = by_cv.run(subs(), by_cv.empty_ledger()).unwrap();
        assert_eq!(out.battles[0].winner(), Some("Lab_A"));
    }

    #[test]
    fn expected_panel_extends_missing_grid() {
        let sim = simulator(ScoringConfig::default())
            .with_expected_parameters(vec!["Glucose".into(), "Sodium".into()]);
        let subs = vec![
            sub("Lab_A", "Glucose", "Jan", Some(1.2), Some(1.0)),
            sub("Lab_B", "Glucose", "Jan", Some(1.4), Some(1.0)),
        ];
        let out = sim.run(subs, sim.empty_ledger()).unwrap();
        assert_eq!(out.missing.len(), 2);
        assert!(out.missing.iter().all(|m| m.parameter == "Sodium"));
    }

    #[test]
    fn disabled_penalizer_leaves_gaps_alone() {
        let sim = simulator(ScoringConfig {
            penalize_missing_submissions: false,
            ..ScoringConfig::default()
        });
        let subs = vec![
            sub("Lab_A", "Glucose", "Jan", Some(1.2), Some(1.0)),
            sub("Lab_B", "Glucose", "Feb", Some(1.4), Some(1.0)),
        ];
        let out = sim.run(subs, sim.empty_ledger()).unwrap();
        assert!(out.missing.is_empty());
        assert_eq!(out.ledger.peek(&RatingKey::new("Lab_A", "Glucose", "L1")), Some(1500.0));
    }

    #[test]
    fn invalid_config_is_rejected_before_work() {
        let sim = simulator(ScoringConfig {
            k_factor: f64::INFINITY,
            ..ScoringConfig::default()
        });
        let err = sim.run(vec![], sim.empty_ledger()).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_batch_is_rejected_whole() {
        let sim = simulator(ScoringConfig::default());
        let subs = vec![
            sub("Lab_A", "Glucose", "Jan", Some(1.2), Some(1.0)),
            sub("", "Glucose", "Jan", Some(1.4), Some(1.0)),
        ];
        let err = sim.run(subs, sim.empty_ledger()).unwrap_err();
        match err {
            SimulationError::Validation(v) => assert_eq!(v.issues.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn carried_ledger_continues_from_prior_ratings() {
        let sim = simulator(ScoringConfig::default());
        let mut prior = sim.empty_ledger();
        prior.set(&RatingKey::new("Lab_A", "Glucose", "L1"), 1600.0);
        let subs = vec![
            sub("Lab_A", "Glucose", "Feb", Some(1.2), Some(0.9)),
            sub("Lab_B", "Glucose", "Feb", Some(1.4), Some(0.9)),
        ];
        let out = sim.run(subs, prior).unwrap();
        let b = &out.battles[0];
        assert_eq!(b.previous_rating_a, 1600.0);
        assert!(b.rating_delta_a() < 8.0);
    }
}
