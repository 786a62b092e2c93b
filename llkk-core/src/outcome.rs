//! Outcome rule: scoring one match between two submissions.
//!
//! The CV contest decides who performed better (lower CV wins, close CVs
//! draw). Bonuses and penalties are layered on top to form the outcome score
//! shown in the battle log. The Elo result is derived from these scores but is
//! a separate value: a numeric edge in the log never feeds the rating formula
//! directly.

use crate::config::{OutcomeBasis, ScoringConfig};
use crate::domain::SubmissionRecord;
use crate::targets::QualityTargets;

/// Score breakdown for one side of a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideOutcome {
    /// 1 win, 0.5 draw/undecided, 0 loss.
    pub cv_score: f64,
    pub bonus: f64,
    pub penalty: f64,
}

impl SideOutcome {
    pub fn outcome_score(&self) -> f64 {
        self.cv_score + self.bonus - self.penalty
    }

    /// Net additive adjustment, applied to ratings under `AdjustmentPolicy::Rating`.
    pub fn adjustment(&self) -> f64 {
        self.bonus - self.penalty
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub a: SideOutcome,
    pub b: SideOutcome,
}

impl MatchOutcome {
    /// Elo result for side A: 1 if A's basis score is strictly greater, 0 if
    /// strictly smaller, 0.5 when equal.
    pub fn elo_outcome_a(&self, basis: OutcomeBasis) -> f64 {
        let (a, b) = match basis {
            OutcomeBasis::FinalScore => (self.a.outcome_score(), self.b.outcome_score()),
            OutcomeBasis::CvContest => (self.a.cv_score, self.b.cv_score),
        };
        if a > b {
            1.0
        } else if a < b {
            0.0
        } else {
            0.5
        }
    }
}

/// Pure match evaluation against a fixed config and target table.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeRule<'a> {
    config: &'a ScoringConfig,
    targets: &'a QualityTargets,
}

impl<'a> OutcomeRule<'a> {
    pub fn new(config: &'a ScoringConfig, targets: &'a QualityTargets) -> Self {
        Self { config, targets }
    }

    pub fn evaluate(
        &self,
        sub_a: &SubmissionRecord,
        sub_b: &SubmissionRecord,
        parameter: &str,
    ) -> MatchOutcome {
        let (cv_score_a, cv_score_b) = self.cv_contest(sub_a.cv, sub_b.cv);
        MatchOutcome {
            a: SideOutcome {
                cv_score: cv_score_a,
                bonus: self.bonus(sub_a, parameter),
                penalty: self.penalty(sub_a),
            },
            b: SideOutcome {
                cv_score: cv_score_b,
                bonus: self.bonus(sub_b, parameter),
                penalty: self.penalty(sub_b),
            },
        }
    }

    /// Lower CV wins. Undecided (0.5/0.5) when either CV is missing.
    pub fn cv_contest(&self, cv_a: Option<f64>, cv_b: Option<f64>) -> (f64, f64) {
        let (Some(a), Some(b)) = (cv_a, cv_b) else {
            return (0.5, 0.5);
        };
        if (a - b).abs() < self.config.cv_draw_tolerance {
            (0.5, 0.5)
        } else if a < b {
            (1.0, 0.0)
        } else {
            (0.0, 1.0)
        }
    }

    fn bonus(&self, sub: &SubmissionRecord, parameter: &str) -> f64 {
        let mut bonus = 0.0;
        if sub.ratio.is_some_and(|r| r >= self.config.ratio_bonus_threshold) {
            bonus += self.config.ratio_bonus;
        }
        if let (Some(cv), Some(target)) = (sub.cv, self.targets.target_for(parameter)) {
            if cv <= target {
                bonus += self.config.target_bonus;
            }
        }
        bonus
    }

    fn penalty(&self, sub: &SubmissionRecord) -> f64 {
        if sub.has_missing_metric() {
            self.config.missing_data_penalty
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Month;

    fn sub(lab: &str, cv: Option<f64>, ratio: Option<f64>) -> SubmissionRecord {
        SubmissionRecord {
            lab: lab.into(),
            parameter: "Glucose".into(),
            level: "L1".into(),
            month: Month::from("Jan"),
            cv,
            ratio,
            sample_count: 20,
            working_days: 22,
        }
    }

    fn evaluate(a: &SubmissionRecord, b: &SubmissionRecord, parameter: &str) -> MatchOutcome {
        let config = ScoringConfig::default();
        let targets = QualityTargets::eflm();
        OutcomeRule::new(&config, &targets).evaluate(a, b, parameter)
    }

    #[test]
    fn lower_cv_wins_outside_tolerance() {
        let o = evaluate(&sub("A", Some(1.2), Some(0.9)), &sub("B", Some(1.4), Some(0.9)), "Glucose");
        assert_eq!((o.a.cv_score, o.b.cv_score), (1.0, 0.0));
        assert_eq!(o.elo_outcome_a(OutcomeBasis::FinalScore), 1.0);
    }

    #[test]
    fn close_cvs_draw() {
        let o = evaluate(&sub("A", Some(1.20), Some(0.9)), &sub("B", Some(1.25), Some(0.9)), "Glucose");
        assert_eq!((o.a.cv_score, o.b.cv_score), (0.5, 0.5));
        assert_eq!(o.elo_outcome_a(OutcomeBasis::CvContest), 0.5);
    }

    #[test]
    fn missing_cv_is_undecided_and_penalized() {
        let o = evaluate(&sub("A", None, Some(1.2)), &sub("B", Some(3.0), Some(0.5)), "Glucose");
        assert_eq!((o.a.cv_score, o.b.cv_score), (0.5, 0.5));
        assert_eq!(o.a.penalty, 10.0);
        assert_eq!(o.b.penalty, 0.0);
        // A: ratio bonus only; B: nothing
        assert_eq!(o.a.bonus, 5.0);
        assert_eq!(o.b.bonus, 0.0);
    }

    #[test]
    fn missing_ratio_penalizes_without_touching_cv_contest() {
        let o = evaluate(&sub("A", Some(1.0), None), &sub("B", Some(2.0), Some(1.0)), "Unknown");
        assert_eq!((o.a.cv_score, o.b.cv_score), (1.0, 0.0));
        assert_eq!(o.a.penalty, 10.0);
        assert_eq!(o.b.bonus, 5.0);
        // 1 - 10 vs 0 + 5: B takes the Elo result on final score
        assert_eq!(o.a.outcome_score(), -9.0);
        assert_eq!(o.b.outcome_score(), 5.0);
        assert_eq!(o.elo_outcome_a(OutcomeBasis::FinalScore), 0.0);
        assert_eq!(o.elo_outcome_a(OutcomeBasis::CvContest), 1.0);
    }

    #[test]
    fn target_bonus_requires_known_parameter() {
        let a = sub("A", Some(2.0), Some(0.5));
        let b = sub("B", Some(5.0), Some(0.5));
        let known = evaluate(&a, &b, "Glucose");
        assert_eq!(known.a.bonus, 2.0);
        assert_eq!(known.b.bonus, 0.0);

        let unknown = evaluate(&a, &b, "Unobtainium");
        assert_eq!(unknown.a.bonus, 0.0);
    }

    #[test]
    fn target_bonus_is_inclusive() {
        let o = evaluate(&sub("A", Some(2.4), Some(0.5)), &sub("B", Some(9.0), Some(0.5)), "Glucose");
        assert_eq!(o.a.bonus, 2.0);
    }

    #[test]
    fn ratio_bonus_threshold_is_inclusive() {
        let o = evaluate(&sub("A", Some(9.0), Some(1.0)), &sub("B", Some(9.0), Some(0.99)), "Urea");
        assert_eq!(o.a.bonus, 5.0);
        assert_eq!(o.b.bonus, 0.0);
        assert_eq!(o.a.adjustment(), 5.0);
    }
}
