//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. CV monotonicity: a clearly lower CV always wins the CV contest
//! 2. Draw symmetry: CVs within tolerance always split 0.5/0.5
//! 3. Zero-sum Elo: without additive adjustments a match moves no net rating
//! 4. Determinism: shuffled input and repeated runs give identical output
//! 5. Missing-submission penalty: exactly one penalty per absent slot

use proptest::prelude::*;
use llkk_core::config::ScoringConfig;
use llkk_core::elo::EloUpdater;
use llkk_core::outcome::OutcomeRule;
use llkk_core::{BattleSimulator, Month, QualityTargets, RatingKey, SubmissionRecord};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_cv() -> impl Strategy<Value = f64> {
    (0.1..20.0_f64).prop_map(|v| (v * 100.0).round() / 100.0)
}

fn arb_rating() -> impl Strategy<Value = f64> {
    800.0..2200.0_f64
}

fn arb_metric() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![3 => arb_cv().prop_map(Some), 1 => Just(None)]
}

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

/// A small arena: up to 4 labs × 2 parameters × 3 months, with random gaps.
fn arb_batch() -> impl Strategy<Value = Vec<SubmissionRecord>> {
    let labs = ["Lab_A", "Lab_B", "Lab_C", "Lab_D"];
    let params = ["Glucose", "Urea"];
    let months = ["Jan", "Feb", "Mar"];
    let mut slots = Vec::new();
    for lab in labs {
        for param in params {
            for month in months {
                slots.push((lab, param, month));
            }
        }
    }
    let n = slots.len();
    proptest::collection::vec((any::<bool>(), arb_metric(), arb_metric()), n).prop_map(move |cells| {
        slots
            .iter()
            .zip(cells)
            .filter(|(_, (present, _, _))| *present)
            .map(|((lab, param, month), (_, cv, ratio))| sub(lab, param, month, cv, ratio))
            .collect()
    })
}

// ── 1. CV monotonicity ───────────────────────────────────────────────

proptest! {
    #[test]
    fn clearly_lower_cv_wins(cv_a in arb_cv(), gap in 0.11..10.0_f64) {
        let config = ScoringConfig::default();
        let targets = QualityTargets::eflm();
        let rule = OutcomeRule::new(&config, &targets);
        let cv_b = cv_a + gap;
        let (a, b) = rule.cv_contest(Some(cv_a), Some(cv_b));
        prop_assert_eq!((a, b), (1.0, 0.0));
        let (b_rev, a_rev) = rule.cv_contest(Some(cv_b), Some(cv_a));
        prop_assert_eq!((a_rev, b_rev), (1.0, 0.0));
    }

    // ── 2. Draw symmetry ─────────────────────────────────────────────

    #[test]
    fn cvs_within_tolerance_draw(cv_a in arb_cv(), gap in 0.0..0.09_f64) {
        let config = ScoringConfig::default();
        let targets = QualityTargets::eflm();
        let rule = OutcomeRule::new(&config, &targets);
        prop_assert_eq!(rule.cv_contest(Some(cv_a), Some(cv_a + gap)), (0.5, 0.5));
        prop_assert_eq!(rule.cv_contest(Some(cv_a + gap), Some(cv_a)), (0.5, 0.5));
    }

    // ── 3. Zero-sum Elo ──────────────────────────────────────────────

    #[test]
    fn elo_update_is_rating_conservative(
        ra in arb_rating(),
        rb in arb_rating(),
        outcome in prop_oneof![Just(0.0), Just(0.5), Just(1.0)],
        k in 1.0..64.0_f64,
    ) {
        let (na, nb) = EloUpdater::new(k).update(ra, rb, outcome);
        prop_assert!(((na - ra) + (nb - rb)).abs() < 1e-9);
    }

    #[test]
    fn score_only_battles_are_zero_sum(batch in arb_batch()) {
        let sim = BattleSimulator::new(ScoringConfig::default(), QualityTargets::eflm());
        let out = sim.run(batch, sim.empty_ledger()).unwrap();
        for b in &out.battles {
            prop_assert!((b.rating_delta_a() + b.rating_delta_b()).abs() < 1e-9);
        }
    }

    // ── 4. Determinism ───────────────────────────────────────────────

    #[test]
    fn repeated_runs_are_bit_identical(batch in arb_batch()) {
        let sim = BattleSimulator::new(ScoringConfig::default(), QualityTargets::eflm());
        let first = sim.run(batch.clone(), sim.empty_ledger()).unwrap();
        let second = sim.run(batch, sim.empty_ledger()).unwrap();
        prop_assert_eq!(&first.battles, &second.battles);
        prop_assert_eq!(&first.ledger, &second.ledger);
        prop_assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn input_order_does_not_matter(batch in arb_batch().prop_shuffle()) {
        let sim = BattleSimulator::new(ScoringConfig::default(), QualityTargets::eflm());
        let mut sorted = batch.clone();
        sorted.sort_by(|a, b| (&a.lab, &a.parameter, &a.month).cmp(&(&b.lab, &b.parameter, &b.month)));
        let shuffled = sim.run(batch, sim.empty_ledger()).unwrap();
        let canonical = sim.run(sorted, sim.empty_ledger()).unwrap();
        prop_assert_eq!(shuffled.fingerprint(), canonical.fingerprint());
    }

    // ── 5. Missing-submission penalty ────────────────────────────────

    #[test]
    fn one_penalty_per_missing_slot(batch in arb_batch()) {
        let config = ScoringConfig::default();
        let sim = BattleSimulator::new(config.clone(), QualityTargets::eflm());
        let grid = sim.expected_grid(&batch);
        let out = sim.run(batch.clone(), sim.empty_ledger()).unwrap();

        prop_assert_eq!(out.missing.len(), grid.len() - batch.len());
        for slot in &out.missing {
            prop_assert!(!out.battles.iter().any(|b| b.month == slot.month
                && b.parameter == slot.parameter
                && b.involves(&slot.lab)));
        }

        // Without battles touching a key, penalties alone move it.
        let mut no_battle = sim.empty_ledger();
        for slot in &out.missing {
            no_battle.adjust(&RatingKey::new(&slot.lab, &slot.parameter, &slot.level), -config.missing_submission_penalty);
        }
        for (key, rating) in no_battle.ratings() {
            let touched = out.battles.iter().any(|b| b.parameter == key.parameter && b.involves(&key.lab))
                || out.submissions.iter().any(|s| s.lab == key.lab && s.parameter == key.parameter);
            if !touched {
                prop_assert_eq!(out.ledger.peek(key), Some(rating));
            }
        }
    }
}
