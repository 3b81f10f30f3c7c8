#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting food placement
//! commands.
//!
//! Free cells are enumerated up front and one is drawn uniformly, so a fully
//! occupied board terminates the round instead of spinning on rejected
//! placements.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use trailgrid_core::{AgentView, CellCoord, Command, Event, GridBounds};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that reacts to spawn requests with food placement commands.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    ///
    /// Every draw derives from the seed, so identical event streams produce
    /// identical placements.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events and the pre-move agent view to emit placement commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: GridBounds,
        agents: &AgentView,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if !matches!(event, Event::FoodSpawnNeeded) {
                continue;
            }

            match self.select_free_cell(grid, agents) {
                Some(cell) => out.push(Command::PlaceFood { cell }),
                None => out.push(Command::DeclareBoardFull),
            }
        }
    }

    /// Draws a uniformly random cell outside every agent trail.
    ///
    /// Returns `None` when no free cell exists.
    fn select_free_cell(&mut self, grid: GridBounds, agents: &AgentView) -> Option<CellCoord> {
        let occupied: HashSet<CellCoord> = agents
            .iter()
            .flat_map(|agent| agent.trail.iter().copied())
            .collect();

        let capacity = usize::try_from(grid.cell_count()).unwrap_or(0);
        let mut free: Vec<CellCoord> = Vec::with_capacity(capacity.saturating_sub(occupied.len()));
        for row in 0..grid.rows() {
            for column in 0..grid.columns() {
                let cell = CellCoord::new(column, row);
                if !occupied.contains(&cell) {
                    free.push(cell);
                }
            }
        }

        if free.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..free.len());
        Some(free[index])
    }
}
