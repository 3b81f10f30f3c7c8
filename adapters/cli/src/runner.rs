//! Frame pump that drives a round from start to terminal outcome.
//!
//! Each frame delivers heading intents, advances one tick, and pumps the
//! spawning system so food placed after consumption lands within the same
//! frame. The engine exposes no clock; the pump decides when ticks happen.

use trailgrid_core::{Command, Event, GameMode, GridBounds, RoundOutcome};
use trailgrid_system_spawning::{Config as SpawnConfig, Spawning};
use trailgrid_world::{self as world, query, AgentSeed, RoundConfig, World};

use crate::pilot;
use crate::transcript::{TickIntents, TranscriptAgent};

/// Everything needed to reproduce a round from scratch.
#[derive(Clone, Debug)]
pub(crate) struct RunnerConfig {
    /// Dimensions of the playing field.
    pub grid: GridBounds,
    /// Ruleset to open the round with.
    pub mode: GameMode,
    /// Starvation frame budget for forage mode.
    pub max_frames: Option<u32>,
    /// Seed driving the food spawner.
    pub rng_seed: u64,
    /// Starting cell and heading per agent, in identifier order.
    pub agents: Vec<TranscriptAgent>,
    /// Safety cap on the number of ticks to simulate.
    pub max_ticks: u64,
}

/// Result of driving a round to completion.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RoundReport {
    /// Terminal classification, or `None` when the tick cap was reached.
    pub outcome: Option<RoundOutcome>,
    /// Ticks completed when the round stopped.
    pub ticks: u64,
    /// Food items consumed.
    pub score: u32,
    /// Survival-and-feeding accumulator.
    pub fitness: i64,
    /// Heading intents delivered before each tick, for transcripts.
    pub intents: Vec<TickIntents>,
}

enum IntentSource<'a> {
    Pilot,
    Recorded(&'a [TickIntents]),
}

/// Runs a fresh round steered by the deterministic pilot.
pub(crate) fn run_round(config: &RunnerConfig) -> RoundReport {
    drive(config, IntentSource::Pilot)
}

/// Re-runs a round feeding it previously recorded intents.
pub(crate) fn replay_round(config: &RunnerConfig, ticks: &[TickIntents]) -> RoundReport {
    drive(config, IntentSource::Recorded(ticks))
}

fn drive(config: &RunnerConfig, source: IntentSource<'_>) -> RoundReport {
    let seeds = config
        .agents
        .iter()
        .map(|agent| AgentSeed::new(agent.cell, agent.heading))
        .collect();
    let mut round_config = RoundConfig::new(config.grid, config.mode, seeds);
    if let Some(max_frames) = config.max_frames {
        round_config = round_config.with_max_frames(max_frames);
    }

    let mut world = World::new(round_config);
    let mut spawning = Spawning::new(SpawnConfig::new(config.rng_seed));
    let mut recorded: Vec<TickIntents> = Vec::new();

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartRound, &mut events);
    pump_spawning(&mut world, &mut spawning, events);

    for frame in 0..config.max_ticks {
        if query::round(&world).outcome.is_some() {
            break;
        }

        let intents = match &source {
            IntentSource::Pilot => {
                let mut commands = Vec::new();
                pilot::steer(
                    query::grid(&world),
                    &query::agent_view(&world),
                    query::food(&world),
                    &mut commands,
                );
                commands
                    .into_iter()
                    .filter_map(|command| match command {
                        Command::SetHeading { agent, direction } => Some((agent, direction)),
                        _ => None,
                    })
                    .collect()
            }
            IntentSource::Recorded(ticks) => ticks
                .get(usize::try_from(frame).unwrap_or(usize::MAX))
                .map(|tick| tick.intents.clone())
                .unwrap_or_default(),
        };

        let mut events = Vec::new();
        for (agent, direction) in &intents {
            world::apply(
                &mut world,
                Command::SetHeading {
                    agent: *agent,
                    direction: *direction,
                },
                &mut events,
            );
        }
        recorded.push(TickIntents { intents });

        world::apply(&mut world, Command::Tick, &mut events);
        pump_spawning(&mut world, &mut spawning, events);
    }

    let round = query::round(&world);
    RoundReport {
        outcome: round.outcome,
        ticks: round.tick,
        score: round.score,
        fitness: round.fitness,
        intents: recorded,
    }
}

fn pump_spawning(world: &mut World, spawning: &mut Spawning, mut events: Vec<Event>) {
    loop {
        if events.is_empty() {
            break;
        }
        let grid = query::grid(world);
        let agents = query::agent_view(world);
        let mut commands = Vec::new();
        spawning.handle(&events, grid, &agents, &mut commands);
        if commands.is_empty() {
            break;
        }
        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}
