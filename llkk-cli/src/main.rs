//! LLKK CLI: run the battle arena over monthly QC uploads.
//!
//! Commands:
//! - `simulate`: ingest an upload, play every battle, save ratings, export results
//! - `battles`: preview the battle log for an upload without saving anything
//! - `leaderboard`: rank labs from saved ratings
//! - `progression`: rating history per lab/parameter/level
//! - `history`: past runs with fingerprints
//! - `sample`: write a seeded synthetic upload
//! - `reset`: delete saved ratings, progression and history

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use llkk_core::BattleRecord;
use llkk_runner::export::write_artifacts;
use llkk_runner::ingest::{read_submissions_file, write_submissions};
use llkk_runner::sample_data::{self, SamplePlan};
use llkk_runner::store::LedgerStore;
use llkk_runner::{
    load_leaderboard, load_progression, reset_state, run_batch, run_simulation, ArenaConfig,
    LeaderboardEntry, ProgressionFilter, RunHistory, RunOptions,
};

#[derive(Parser)]
#[command(
    name = "llkk",
    about = "LLKK battle arena: Elo ratings for laboratory QC performance"
)]
struct Cli {
    /// Arena config TOML. Defaults to built-in rules.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding ratings, progression and run history.
    #[arg(long, global = true, default_value = "data")]
    state_dir: PathBuf,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate an upload against saved ratings and persist the result.
    Simulate {
        /// Submissions CSV.
        #[arg(long)]
        input: PathBuf,

        /// Output directory for CSV/JSON artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Ignore saved ratings and start from the base rating.
        #[arg(long, default_value_t = false)]
        fresh: bool,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_export: bool,
    },
    /// Preview the battle log for an upload. Nothing is saved.
    Battles {
        /// Submissions CSV.
        #[arg(long)]
        input: PathBuf,

        /// Only battles involving this lab.
        #[arg(long)]
        lab: Option<String>,

        /// Only battles on this parameter.
        #[arg(long)]
        parameter: Option<String>,
    },
    /// Rank labs from saved ratings.
    Leaderboard {
        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Rating history from saved progression.
    Progression {
        #[arg(long)]
        lab: Option<String>,
        #[arg(long)]
        parameter: Option<String>,
        #[arg(long)]
        level: Option<String>,
    },
    /// List past runs.
    History {
        /// Show only the most recent N runs.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write a seeded synthetic upload.
    Sample {
        /// Number of labs.
        #[arg(long, default_value_t = 5)]
        labs: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output CSV path.
        #[arg(long, default_value = "sample_submissions.csv")]
        out: PathBuf,
    },
    /// Delete saved ratings, progression and run history.
    Reset {
        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(config = ?cli.config, state_dir = %cli.state_dir.display(), "starting");

    let config = match &cli.config {
        Some(path) => ArenaConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ArenaConfig::default(),
    };

    match cli.command {
        Commands::Simulate {
            input,
            output_dir,
            fresh,
            no_export,
        } => run_simulate_cmd(&config, &cli.state_dir, input, &output_dir, fresh, no_export),
        Commands::Battles {
            input,
            lab,
            parameter,
        } => run_battles_cmd(&config, &cli.state_dir, &input, lab, parameter),
        Commands::Leaderboard { json } => run_leaderboard_cmd(&config, &cli.state_dir, json),
        Commands::Progression {
            lab,
            parameter,
            level,
        } => {
            let filter = ProgressionFilter {
                lab,
                parameter,
                level,
            };
            run_progression_cmd(&config, &cli.state_dir, &filter)
        }
        Commands::History { limit } => run_history_cmd(&cli.state_dir, limit),
        Commands::Sample { labs, seed, out } => run_sample_cmd(labs, seed, &out),
        Commands::Reset { confirm } => run_reset_cmd(&cli.state_dir, confirm),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "llkk=debug,info" } else { "llkk=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_simulate_cmd(
    config: &ArenaConfig,
    state_dir: &Path,
    input: PathBuf,
    output_dir: &Path,
    fresh: bool,
    no_export: bool,
) -> Result<()> {
    if !input.exists() {
        bail!("input file not found: {}", input.display());
    }

    let options = RunOptions {
        input,
        state_dir: state_dir.to_path_buf(),
        fresh,
    };
    let run = run_simulation(config, &options)?;

    for dropped in &run.dropped {
        println!("WARNING: row {} skipped: {}", dropped.row, dropped.reason);
    }

    let report = &run.report;
    println!();
    println!("=== Simulation Result ===");
    println!("Fingerprint:    {}", report.fingerprint.short());
    println!("Submissions:    {}", report.submissions);
    println!(
        "Cohorts:        {} contested, {} single-lab",
        report.cohorts_contested, report.cohorts_uncontested
    );
    println!("Battles:        {}", report.battles.len());
    println!("Missing slots:  {}", report.missing.len());
    println!("Rating keys:    {}", report.ledger.len());
    if fresh {
        println!("Mode:           fresh (saved ratings ignored)");
    }

    print_leaderboard(&report.leaderboard, true);

    if !no_export {
        let written = write_artifacts(report, output_dir)?;
        println!("Artifacts:");
        for path in written {
            println!("  {}", path.display());
        }
        println!();
    }
    Ok(())
}

fn run_battles_cmd(
    config: &ArenaConfig,
    state_dir: &Path,
    input: &Path,
    lab: Option<String>,
    parameter: Option<String>,
) -> Result<()> {
    let ingested = read_submissions_file(input)?;
    let ledger = LedgerStore::new(state_dir).load(config.scoring.base_rating)?;
    let report = run_batch(config, ingested.records, ledger)?;

    let shown: Vec<&BattleRecord> = report
        .battles
        .iter()
        .filter(|b| lab.as_deref().map_or(true, |l| b.involves(l)))
        .filter(|b| parameter.as_deref().map_or(true, |p| b.parameter == p))
        .collect();

    if shown.is_empty() {
        println!("No battles match.");
        return Ok(());
    }

    println!(
        "{:<8} {:<18} {:<4} {:<14} {:<14} {:>7} {:>7} {:>9} {:>9}",
        "Month", "Parameter", "Lvl", "Lab A", "Lab B", "Score A", "Score B", "Rating A", "Rating B"
    );
    for b in &shown {
        println!(
            "{:<8} {:<18} {:<4} {:<14} {:<14} {:>7} {:>7} {:>9.1} {:>9.1}",
            b.month.as_str(),
            b.parameter,
            b.level,
            b.lab_a,
            b.lab_b,
            b.outcome_score_a,
            b.outcome_score_b,
            b.new_rating_a,
            b.new_rating_b,
        );
    }
    println!();
    println!("{} battle(s) shown, preview only, nothing saved.", shown.len());
    Ok(())
}

fn run_leaderboard_cmd(config: &ArenaConfig, state_dir: &Path, json: bool) -> Result<()> {
    let board = load_leaderboard(config, state_dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }
    if board.is_empty() {
        println!("No ratings saved in {}.", state_dir.display());
        return Ok(());
    }
    print_leaderboard(&board, false);
    println!("Score and W/D/L are per run: see `simulate` output or results/leaderboard.csv.");
    Ok(())
}

fn run_progression_cmd(
    config: &ArenaConfig,
    state_dir: &Path,
    filter: &ProgressionFilter,
) -> Result<()> {
    let entries = load_progression(config, state_dir, filter)?;
    if entries.is_empty() {
        println!("No progression entries match.");
        return Ok(());
    }
    println!(
        "{:<14} {:<18} {:<4} {:<8} {:>9}",
        "Lab", "Parameter", "Lvl", "Month", "Rating"
    );
    for e in &entries {
        println!(
            "{:<14} {:<18} {:<4} {:<8} {:>9.2}",
            e.lab,
            e.parameter,
            e.level,
            e.month.as_str(),
            e.rating
        );
    }
    Ok(())
}

fn run_history_cmd(state_dir: &Path, limit: Option<usize>) -> Result<()> {
    let runs = RunHistory::in_dir(state_dir).read_all()?;
    if runs.is_empty() {
        println!("No runs recorded in {}.", state_dir.display());
        return Ok(());
    }
    let skip = limit.map_or(0, |n| runs.len().saturating_sub(n));
    println!(
        "{:<20} {:<12} {:>6} {:>8} {:>8} {:<14} {:>9}",
        "Timestamp", "Fingerprint", "Subs", "Battles", "Missing", "Leader", "Rating"
    );
    for run in runs.iter().skip(skip) {
        println!(
            "{:<20} {:<12} {:>6} {:>8} {:>8} {:<14} {:>9}",
            run.timestamp.format("%Y-%m-%d %H:%M:%S"),
            &run.fingerprint.0[..run.fingerprint.0.len().min(12)],
            run.submissions,
            run.battles,
            run.missing_slots,
            run.leader.as_deref().unwrap_or("-"),
            run.leader_rating
                .map(|r| format!("{r:.1}"))
                .unwrap_or_else(|| "-".into()),
        );
    }
    Ok(())
}

fn run_sample_cmd(labs: usize, seed: u64, out: &Path) -> Result<()> {
    if labs < 2 {
        bail!("need at least 2 labs for any battle, got {labs}");
    }
    let plan = SamplePlan {
        labs,
        seed,
        ..SamplePlan::default()
    };
    let records = sample_data::generate(&plan);
    let file = std::fs::File::create(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    write_submissions(file, &records)?;
    println!(
        "Wrote {} submissions for {labs} labs (seed {seed}) to {}",
        records.len(),
        out.display()
    );
    Ok(())
}

fn run_reset_cmd(state_dir: &Path, confirm: bool) -> Result<()> {
    let store = LedgerStore::new(state_dir);
    let history = RunHistory::in_dir(state_dir);
    let targets: Vec<PathBuf> = [
        store.ratings_path(),
        store.progression_path(),
        history.path().to_path_buf(),
    ]
    .into_iter()
    .filter(|p| p.exists())
    .collect();

    if targets.is_empty() {
        println!("Nothing to reset in {}.", state_dir.display());
        return Ok(());
    }

    println!("Would remove:");
    for path in &targets {
        println!("  {}", path.display());
    }
    if !confirm {
        println!();
        println!("Dry run: pass --confirm to actually delete.");
        return Ok(());
    }

    let removed = reset_state(state_dir)?;
    println!("Done. Removed {removed} file(s).");
    Ok(())
}

/// `with_record` adds this run's score and W/D/L. Saved state holds ratings
/// only, so the standalone leaderboard omits them.
fn print_leaderboard(board: &[LeaderboardEntry], with_record: bool) {
    println!();
    println!("--- Leaderboard ---");
    if with_record {
        println!(
            "{:>4}  {:<14} {:>9} {:>8} {:>5} {:>9}  Medal",
            "Rank", "Lab", "Rating", "Score", "Keys", "W/D/L"
        );
    } else {
        println!("{:>4}  {:<14} {:>9} {:>5}  Medal", "Rank", "Lab", "Rating", "Keys");
    }
    for e in board {
        let medal = e.medal.map(|m| m.to_string()).unwrap_or_default();
        if with_record {
            println!(
                "{:>4}  {:<14} {:>9.2} {:>8.1} {:>5} {:>9}  {}",
                e.rank,
                e.lab,
                e.final_rating,
                e.total_score,
                e.keys,
                format!("{}/{}/{}", e.wins, e.draws, e.losses),
                medal,
            );
        } else {
            println!(
                "{:>4}  {:<14} {:>9.2} {:>5}  {}",
                e.rank, e.lab, e.final_rating, e.keys, medal
            );
        }
    }
    println!();
}
