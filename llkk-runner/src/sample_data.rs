//! Seeded synthetic submissions for demos and smoke runs.
//!
//! Each lab gets a fixed "precision" factor so the same labs tend to win
//! across months, with month-to-month noise on top. Some slots are skipped
//! and some metrics left blank so the penalty paths get exercised.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use llkk_core::{Month, QualityTargets, SubmissionRecord};

pub const DEFAULT_PARAMETERS: [&str; 6] =
    ["Glucose", "Creatinine", "Urea", "Cholesterol", "ALT", "Sodium"];
pub const DEFAULT_LEVELS: [&str; 2] = ["L1", "L2"];
pub const DEFAULT_MONTHS: [&str; 3] = ["Jan", "Feb", "Mar"];

#[derive(Debug, Clone)]
pub struct SamplePlan {
    pub labs: usize,
    pub parameters: Vec<String>,
    pub levels: Vec<String>,
    pub months: Vec<String>,
    pub seed: u64,
    /// Probability a (lab, parameter, level, month) slot is not reported.
    pub skip_rate: f64,
    /// Probability a reported metric is left blank.
    pub blank_rate: f64,
}

impl Default for SamplePlan {
    fn default() -> Self {
        Self {
            labs: 5,
            parameters: DEFAULT_PARAMETERS.iter().map(|s| s.to_string()).collect(),
            levels: DEFAULT_LEVELS.iter().map(|s| s.to_string()).collect(),
            months: DEFAULT_MONTHS.iter().map(|s| s.to_string()).collect(),
            seed: 42,
            skip_rate: 0.05,
            blank_rate: 0.03,
        }
    }
}

pub fn lab_name(i: usize) -> String {
    let letters = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if i < letters.len() {
        format!("Lab_{}", letters[i] as char)
    } else {
        format!("Lab_{:03}", i + 1)
    }
}

pub fn generate(plan: &SamplePlan) -> Vec<SubmissionRecord> {
    let mut rng = StdRng::seed_from_u64(plan.seed);
    let targets = QualityTargets::eflm();

    let precision: Vec<f64> = (0..plan.labs).map(|_| rng.gen_range(0.5..1.6)).collect();
    let mut out = Vec::new();

    for (lab_idx, factor) in precision.iter().enumerate() {
        let lab = lab_name(lab_idx);
        for parameter in &plan.parameters {
            let target = targets.target_for(parameter).unwrap_or(3.0);
            for level in &plan.levels {
                for month in &plan.months {
                    if rng.gen_bool(plan.skip_rate) {
                        continue;
                    }
                    let working_days = rng.gen_range(18..=23u32);
                    let sample_count = rng.gen_range(working_days - 4..=working_days + 3);

                    let cv_raw = target * factor * rng.gen_range(0.7..1.3);
                    let cv = (!rng.gen_bool(plan.blank_rate)).then(|| round2(cv_raw));
                    let ratio = (!rng.gen_bool(plan.blank_rate))
                        .then(|| round2(sample_count as f64 / working_days as f64));

                    out.push(SubmissionRecord {
                        lab: lab.clone(),
                        parameter: parameter.clone(),
                        level: level.clone(),
                        month: Month::new(month.clone()),
                        cv,
                        ratio,
                        sample_count,
                        working_days,
                    });
                }
            }
        }
    }
    out
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
