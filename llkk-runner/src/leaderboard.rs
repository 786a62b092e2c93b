//! Lab leaderboard: per-lab rollup of the rating ledger.
//!
//! Rebuilt from scratch after every run. Each lab's per-key ratings are
//! folded into one `final_rating`, battle scores are summed into
//! `total_score`, and labs are ranked with min ranking: equal ratings share
//! a rank and the next distinct rating skips ahead by the size of the tie.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use llkk_core::{BattleRecord, RatingLedger};

/// How a lab's per-(parameter, level) ratings combine into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingAggregation {
    /// Mean over the lab's keys.
    #[default]
    Mean,
    Sum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Medal::Gold => "gold",
            Medal::Silver => "silver",
            Medal::Bronze => "bronze",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub lab: String,
    pub final_rating: f64,
    pub total_score: f64,
    /// Number of (parameter, level) ratings held by the lab.
    pub keys: usize,
    pub battles: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub medal: Option<Medal>,
}

#[derive(Default)]
struct LabTally {
    ratings: Vec<f64>,
    total_score: f64,
    battles: usize,
    wins: usize,
    draws: usize,
    losses: usize,
}

/// Build the ranked leaderboard from the ledger and this run's battle log.
pub fn aggregate(
    ledger: &RatingLedger,
    battles: &[BattleRecord],
    aggregation: RatingAggregation,
) -> Vec<LeaderboardEntry> {
    let mut tallies: BTreeMap<&str, LabTally> = BTreeMap::new();

    for (key, rating) in ledger.ratings() {
        tallies.entry(key.lab.as_str()).or_default().ratings.push(rating);
    }

    for b in battles {
        let winner = b.winner();
        for (lab, score) in [
            (b.lab_a.as_str(), b.outcome_score_a),
            (b.lab_b.as_str(), b.outcome_score_b),
        ] {
            let tally = tallies.entry(lab).or_default();
            tally.total_score += score;
            tally.battles += 1;
            match winner {
                Some(w) if w == lab => tally.wins += 1,
                Some(_) => tally.losses += 1,
                None => tally.draws += 1,
            }
        }
    }

    let mut entries: Vec<LeaderboardEntry> = tallies
        .into_iter()
        .map(|(lab, tally)| {
            let sum: f64 = tally.ratings.iter().sum();
            let final_rating = match aggregation {
                RatingAggregation::Sum => sum,
                RatingAggregation::Mean if tally.ratings.is_empty() => 0.0,
                RatingAggregation::Mean => sum / tally.ratings.len() as f64,
            };
            LeaderboardEntry {
                rank: 0,
                lab: lab.to_string(),
                final_rating,
                total_score: tally.total_score,
                keys: tally.ratings.len(),
                battles: tally.battles,
                wins: tally.wins,
                draws: tally.draws,
                losses: tally.losses,
                medal: None,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.final_rating
            .total_cmp(&a.final_rating)
            .then_with(|| a.lab.cmp(&b.lab))
    });

    assign_min_ranks(&mut entries);
    entries
}

fn assign_min_ranks(entries: &mut [LeaderboardEntry]) {
    let mut previous: Option<f64> = None;
    let mut rank = 0;
    for (i, entry) in entries.iter_mut().enumerate() {
        if previous != Some(entry.final_rating) {
            rank = i + 1;
            previous = Some(entry.final_rating);
        }
        entry.rank = rank;
        entry.medal = Medal::for_rank(rank);
    }
}

/// The top-ranked entries (every lab sharing rank 1).
pub fn champions(entries: &[LeaderboardEntry]) -> impl Iterator<Item = &LeaderboardEntry> {
    entries.iter().take_while(|e| e.rank == 1)
}
