//! Export: CSV tables and a JSON report for a finished run.
//!
//! - `battles.csv`: one row per battle with both sides' scores and ratings
//! - `leaderboard.csv`: ranked labs with medals
//! - `missing.csv`: expected slots with no submission
//! - `progression.csv`: rating snapshots
//! - `report.json`: the full `RunReport`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use llkk_core::{BattleRecord, MissingSlot, ProgressionEntry};

use crate::leaderboard::LeaderboardEntry;
use crate::runner::RunReport;

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_default()
}

// ─── CSV export ─────────────────────────────────────────────────────

pub fn export_battles_csv(battles: &[BattleRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "lab_a",
        "lab_b",
        "parameter",
        "level",
        "month",
        "cv_a",
        "cv_b",
        "ratio_a",
        "ratio_b",
        "cv_score_a",
        "cv_score_b",
        "bonus_a",
        "bonus_b",
        "penalty_a",
        "penalty_b",
        "score_a",
        "score_b",
        "winner",
        "rating_before_a",
        "rating_before_b",
        "rating_after_a",
        "rating_after_b",
    ])?;

    for b in battles {
        wtr.write_record([
            b.lab_a.as_str(),
            b.lab_b.as_str(),
            b.parameter.as_str(),
            b.level.as_str(),
            b.month.as_str(),
            opt(b.cv_a).as_str(),
            opt(b.cv_b).as_str(),
            opt(b.ratio_a).as_str(),
            opt(b.ratio_b).as_str(),
            b.cv_score_a.to_string().as_str(),
            b.cv_score_b.to_string().as_str(),
            b.bonus_a.to_string().as_str(),
            b.bonus_b.to_string().as_str(),
            b.penalty_a.to_string().as_str(),
            b.penalty_b.to_string().as_str(),
            b.outcome_score_a.to_string().as_str(),
            b.outcome_score_b.to_string().as_str(),
            b.winner().unwrap_or("draw"),
            format!("{:.2}", b.previous_rating_a).as_str(),
            format!("{:.2}", b.previous_rating_b).as_str(),
            format!("{:.2}", b.new_rating_a).as_str(),
            format!("{:.2}", b.new_rating_b).as_str(),
        ])?;
    }

    finish(wtr)
}

pub fn export_leaderboard_csv(entries: &[LeaderboardEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "lab",
        "final_rating",
        "total_score",
        "keys",
        "battles",
        "wins",
        "draws",
        "losses",
        "medal",
    ])?;
    for e in entries {
        wtr.write_record([
            e.rank.to_string(),
            e.lab.clone(),
            format!("{:.2}", e.final_rating),
            e.total_score.to_string(),
            e.keys.to_string(),
            e.battles.to_string(),
            e.wins.to_string(),
            e.draws.to_string(),
            e.losses.to_string(),
            e.medal.map(|m| m.to_string()).unwrap_or_default(),
        ])?;
    }
    finish(wtr)
}

pub fn export_missing_csv(missing: &[MissingSlot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["lab", "parameter", "level", "month", "penalty", "rating_after"])?;
    for m in missing {
        wtr.write_record([
            m.lab.as_str(),
            m.parameter.as_str(),
            m.level.as_str(),
            m.month.as_str(),
            m.penalty.to_string().as_str(),
            format!("{:.2}", m.rating_after).as_str(),
        ])?;
    }
    finish(wtr)
}

pub fn export_progression_csv<'a>(
    entries: impl IntoIterator<Item = &'a ProgressionEntry>,
) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["lab", "parameter", "level", "month", "rating"])?;
    for e in entries {
        wtr.write_record([
            e.lab.as_str(),
            e.parameter.as_str(),
            e.level.as_str(),
            e.month.as_str(),
            format!("{:.2}", e.rating).as_str(),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

// ─── Artifact directory ─────────────────────────────────────────────

/// Write every artifact into `dir`, returning the written paths.
pub fn write_artifacts(report: &RunReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let artifacts = [
        ("battles.csv", export_battles_csv(&report.battles)?),
        ("leaderboard.csv", export_leaderboard_csv(&report.leaderboard)?),
        ("missing.csv", export_missing_csv(&report.missing)?),
        (
            "progression.csv",
            export_progression_csv(report.ledger.progression())?,
        ),
        ("report.json", export_json(report)?),
    ];

    let mut written = Vec::with_capacity(artifacts.len());
    for (name, content) in artifacts {
        let path = dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
