#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives Trailgrid rounds headlessly.
//!
//! The binary owns everything the engine treats as external: it selects the
//! grid and ruleset, stands in for keyboard input with a deterministic
//! pilot, decides the tick cadence, and prints a summary once the round
//! reaches a terminal state. Finished rounds are emitted as single-line
//! transcripts that `--replay` can reproduce exactly.

mod pilot;
mod runner;
mod transcript;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use trailgrid_core::{CellCoord, Direction, GameMode, GridBounds, RoundOutcome};

use runner::{replay_round, run_round, RoundReport, RunnerConfig};
use transcript::{RoundTranscript, TranscriptAgent};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Single agent foraging for food until it starves or crashes.
    Forage,
    /// Two agents dueling with permanent trails.
    Versus,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Forage => Self::Forage,
            ModeArg::Versus => Self::Versus,
        }
    }
}

/// Headless driver for the Trailgrid round engine.
#[derive(Debug, Parser)]
#[command(name = "trailgrid")]
struct Args {
    /// Number of grid columns.
    #[arg(long, default_value_t = 20)]
    columns: u32,
    /// Number of grid rows.
    #[arg(long, default_value_t = 20)]
    rows: u32,
    /// Ruleset to play.
    #[arg(long, value_enum, default_value_t = ModeArg::Forage)]
    mode: ModeArg,
    /// Number of agents (1 for forage, 2 for versus).
    #[arg(long, default_value_t = 1)]
    agents: u32,
    /// Frames without food before a forage round times out.
    #[arg(long)]
    max_frames: Option<u32>,
    /// Seed for the food spawner.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Safety cap on simulated ticks.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,
    /// Replay a previously printed transcript instead of a fresh round.
    #[arg(long)]
    replay: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(encoded) = &args.replay {
        return replay(encoded);
    }

    let config = fresh_config(&args)?;
    let report = run_round(&config);
    print_report(&report);

    let transcript = RoundTranscript {
        columns: config.grid.columns(),
        rows: config.grid.rows(),
        mode: config.mode,
        max_frames: config.max_frames,
        rng_seed: config.rng_seed,
        agents: config.agents,
        ticks: report.intents.clone(),
        outcome: report.outcome,
    };
    println!("transcript: {}", transcript.encode());
    Ok(())
}

fn fresh_config(args: &Args) -> anyhow::Result<RunnerConfig> {
    let mode = GameMode::from(args.mode);
    let expected_agents = match mode {
        GameMode::Forage => 1,
        GameMode::Versus => 2,
    };
    if args.agents != expected_agents {
        bail!(
            "{:?} mode requires exactly {expected_agents} agent(s), got {}",
            args.mode,
            args.agents
        );
    }
    if args.columns < 3 || args.rows < 3 {
        bail!("grid must be at least 3x3, got {}x{}", args.columns, args.rows);
    }
    if mode == GameMode::Versus && args.max_frames.is_some() {
        bail!("--max-frames only applies to forage mode");
    }

    let grid = GridBounds::new(args.columns, args.rows);
    let agents = starting_agents(grid, mode);

    Ok(RunnerConfig {
        grid,
        mode,
        max_frames: args.max_frames,
        rng_seed: args.seed,
        agents,
        max_ticks: args.max_ticks,
    })
}

/// Seeds agents the way the classic layouts do: a lone forager starts at
/// the center heading east; duelists face each other across the middle row.
fn starting_agents(grid: GridBounds, mode: GameMode) -> Vec<TranscriptAgent> {
    let middle_row = grid.rows() / 2;
    match mode {
        GameMode::Forage => vec![TranscriptAgent {
            cell: CellCoord::new(grid.columns() / 2, middle_row),
            heading: Direction::East,
        }],
        GameMode::Versus => vec![
            TranscriptAgent {
                cell: CellCoord::new(grid.columns() / 4, middle_row),
                heading: Direction::East,
            },
            TranscriptAgent {
                cell: CellCoord::new(grid.columns() * 3 / 4, middle_row),
                heading: Direction::West,
            },
        ],
    }
}

fn replay(encoded: &str) -> anyhow::Result<()> {
    let transcript =
        RoundTranscript::decode(encoded).context("could not decode the provided transcript")?;

    let config = RunnerConfig {
        grid: GridBounds::new(transcript.columns, transcript.rows),
        mode: transcript.mode,
        max_frames: transcript.max_frames,
        rng_seed: transcript.rng_seed,
        agents: transcript.agents.clone(),
        max_ticks: transcript.ticks.len() as u64 + 1,
    };
    let report = replay_round(&config, &transcript.ticks);
    print_report(&report);

    if report.outcome != transcript.outcome {
        bail!(
            "replay diverged: transcript recorded {:?}, replay produced {:?}",
            transcript.outcome,
            report.outcome
        );
    }
    println!("replay matched the recorded outcome");
    Ok(())
}

fn print_report(report: &RoundReport) {
    match &report.outcome {
        Some(outcome) => println!("outcome: {}", describe_outcome(outcome)),
        None => println!("outcome: undecided (tick cap reached)"),
    }
    println!(
        "ticks: {}  score: {}  fitness: {}",
        report.ticks, report.score, report.fitness
    );
}

fn describe_outcome(outcome: &RoundOutcome) -> String {
    match outcome {
        RoundOutcome::Loss { agent, cause } => {
            format!("agent {} lost ({cause:?})", agent.get())
        }
        RoundOutcome::Draw { crashed } => {
            let agents: Vec<String> = crashed
                .iter()
                .map(|(agent, cause)| format!("{} ({cause:?})", agent.get()))
                .collect();
            format!("draw between agents {}", agents.join(", "))
        }
        RoundOutcome::Timeout => "starvation timeout".to_owned(),
        RoundOutcome::BoardFull => "board full, nothing left to spawn".to_owned(),
    }
}
