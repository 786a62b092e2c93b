//! Run fingerprinting: a content hash of a simulation's output.
//!
//! Two runs over the same submissions and starting ledger must produce the
//! same battle log and final ratings bit-for-bit. Hashing every battle field
//! and every rating (as raw `f64` bits) makes that cheap to check and to
//! record in the run history.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{BattleRecord, Month};
use crate::ledger::RatingLedger;

/// BLAKE3 digest (hex) over battle log + final ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint(pub String);

impl RunFingerprint {
    pub fn compute(battles: &[BattleRecord], ledger: &RatingLedger) -> Self {
        let mut hasher = blake3::Hasher::new();

        hasher.update(&(battles.len() as u64).to_le_bytes());
        for b in battles {
            for s in [&b.lab_a, &b.lab_b, &b.parameter, &b.level] {
                hash_str(&mut hasher, s);
            }
            hash_month(&mut hasher, &b.month);
            for v in [b.cv_a, b.cv_b, b.ratio_a, b.ratio_b] {
                hash_opt(&mut hasher, v);
            }
            for v in [
                b.cv_score_a,
                b.cv_score_b,
                b.bonus_a,
                b.bonus_b,
                b.penalty_a,
                b.penalty_b,
                b.outcome_score_a,
                b.outcome_score_b,
                b.elo_outcome_a,
                b.previous_rating_a,
                b.previous_rating_b,
                b.new_rating_a,
                b.new_rating_b,
            ] {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }

        hasher.update(&(ledger.len() as u64).to_le_bytes());
        for (key, rating) in ledger.ratings() {
            hash_str(&mut hasher, &key.lab);
            hash_str(&mut hasher, &key.parameter);
            hash_str(&mut hasher, &key.level);
            hasher.update(&rating.to_bits().to_le_bytes());
        }

        Self(hasher.finalize().to_hex().to_string())
    }

    /// First 12 hex chars, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RunFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Length-prefixed so ("ab", "c") and ("a", "bc") hash differently.
fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_month(hasher: &mut blake3::Hasher, month: &Month) {
    hash_str(hasher, month.as_str());
}

fn hash_opt(hasher: &mut blake3::Hasher, value: Option<f64>) {
    match value {
        Some(v) => {
            hasher.update(&[1]);
            hasher.update(&v.to_bits().to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}
