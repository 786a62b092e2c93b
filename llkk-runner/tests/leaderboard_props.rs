//! Property tests for the leaderboard and the sample-data pipeline.
//!
//! 1. Min ranking: ranks never decrease and ties share a rank
//! 2. Medals: only ranks 1..=3 carry one
//! 3. Sample pipeline: any seed simulates cleanly and deterministically

use proptest::prelude::*;

use llkk_core::{RatingKey, RatingLedger};
use llkk_runner::sample_data::{generate, SamplePlan};
use llkk_runner::{aggregate, run_batch, ArenaConfig, RatingAggregation};

// ── Strategies ───────────────────────────────────────────────────────

/// Ratings on a coarse grid so ties actually happen.
fn arb_ledger() -> impl Strategy<Value = RatingLedger> {
    proptest::collection::vec((0usize..8, 0usize..3, 0i32..6), 1..30).prop_map(|cells| {
        let mut ledger = RatingLedger::new(1500.0);
        for (lab, param, step) in cells {
            let key = RatingKey::new(format!("Lab_{lab}"), format!("P{param}"), "L1");
            ledger.set(&key, 1480.0 + 10.0 * step as f64);
        }
        ledger
    })
}

proptest! {
    // ── 1. Min ranking ───────────────────────────────────────────────

    #[test]
    fn ranks_are_min_ranks(ledger in arb_ledger(), sum in any::<bool>()) {
        let aggregation = if sum { RatingAggregation::Sum } else { RatingAggregation::Mean };
        let board = aggregate(&ledger, &[], aggregation);

        prop_assert_eq!(board.len(), ledger.labs().len());
        prop_assert_eq!(board[0].rank, 1);
        for (i, pair) in board.windows(2).enumerate() {
            prop_assert!(pair[0].final_rating >= pair[1].final_rating);
            if pair[0].final_rating == pair[1].final_rating {
                prop_assert_eq!(pair[0].rank, pair[1].rank);
            } else {
                prop_assert_eq!(pair[1].rank, i + 2);
            }
        }
    }

    // ── 2. Medals ────────────────────────────────────────────────────

    #[test]
    fn medals_only_on_podium(ledger in arb_ledger()) {
        let board = aggregate(&ledger, &[], RatingAggregation::Mean);
        for entry in &board {
            prop_assert_eq!(entry.medal.is_some(), entry.rank <= 3);
        }
    }

    // ── 3. Sample pipeline ───────────────────────────────────────────

    #[test]
    fn sample_batches_simulate_deterministically(seed in any::<u64>(), labs in 2usize..6) {
        let plan = SamplePlan { labs, seed, ..SamplePlan::default() };
        let config = ArenaConfig::default();
        let first = run_batch(&config, generate(&plan), RatingLedger::new(1500.0)).unwrap();
        let second = run_batch(&config, generate(&plan), RatingLedger::new(1500.0)).unwrap();
        prop_assert_eq!(&first.fingerprint, &second.fingerprint);
        prop_assert_eq!(first.leaderboard.len(), second.leaderboard.len());
    }
}
