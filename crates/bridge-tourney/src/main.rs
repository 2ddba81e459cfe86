use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use bridge_tourney::config::{ResolvedOutputs, TournamentConfig};
use bridge_tourney::logging::init_logging;
use bridge_tourney::runner::TournamentRunner;

/// Duplicate bridge tournament director with bots in every seat.
#[derive(Debug, Parser)]
#[command(
    name = "bridge-tourney",
    author,
    version,
    about = "Mitchell-movement duplicate bridge tournament runner"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "tourney/tourney.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the secret that seeds every deal.
    #[arg(long, value_name = "SECRET")]
    seed_secret: Option<String>,

    /// Override the number of boards each table plays per round.
    #[arg(long, value_name = "BOARDS")]
    boards_per_round: Option<u32>,

    /// Override the number of boards in play.
    #[arg(long, value_name = "BOARDS")]
    total_boards: Option<u32>,

    /// Pause between bot actions, in milliseconds.
    #[arg(long, value_name = "MS")]
    tempo_ms: Option<u64>,

    /// Exit after validating the configuration (no tournament is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = TournamentConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(secret) = cli.seed_secret {
        config.tournament.secret = secret;
    }

    if let Some(boards) = cli.boards_per_round {
        config.tournament.boards_per_round = boards;
    }

    if let Some(boards) = cli.total_boards {
        config.tournament.total_boards = boards;
    }

    if let Some(tempo_ms) = cli.tempo_ms {
        config.tournament.tempo_ms = tempo_ms;
    }

    config
        .validate()
        .with_context(|| format!("validating {}", cli.config.display()))?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let pairs = config.pairs.len();
    let boards = config.tournament.total_boards;

    println!(
        "Loaded configuration '{run_id}' with {pairs} pair{} ({boards} boards, {} per round)",
        if pairs == 1 { "" } else { "s" },
        config.tournament.boards_per_round
    );

    if cli.validate_only {
        println!("Validation-only mode: tournament execution skipped.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = TournamentRunner::new(config, outputs).context("signing up pairs")?;
    let summary = runner.run()?;
    println!(
        "Tournament complete for '{run_id}': {} hands played, {} restored → {} rows at {}",
        summary.hands_played,
        summary.hands_restored,
        summary.rows_written,
        summary.results_path.display()
    );
    println!("Standings: {}", summary.standings_path.display());
    if let Some((pair, tally)) = summary.standings.ranked().first() {
        println!("  Leader: {pair} with {:.2}%", tally.percentage);
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
