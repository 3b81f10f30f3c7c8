#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative round state management for Trailgrid.
//!
//! The world owns every agent trail, the food cell, and the round scoring
//! counters. All mutation flows through [`apply`]; systems and adapters only
//! ever observe the world through the read-only [`query`] module.

use std::collections::VecDeque;

use trailgrid_core::{
    AgentId, AgentSnapshot, AgentView, CellCoord, Command, Direction, Event, FoodPlacementError,
    GameMode, GridBounds, RoundOutcome,
};
use trailgrid_system_resolution::{self as resolution, Verdict};

/// Starting position and heading for a single agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentSeed {
    cell: CellCoord,
    heading: Direction,
}

impl AgentSeed {
    /// Creates a new agent seed at the provided cell and heading.
    #[must_use]
    pub const fn new(cell: CellCoord, heading: Direction) -> Self {
        Self { cell, heading }
    }

    /// Cell the agent occupies when the round opens.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Direction the agent travels on the first tick.
    #[must_use]
    pub const fn heading(&self) -> Direction {
        self.heading
    }
}

/// Configuration required to open a round.
#[derive(Clone, Debug)]
pub struct RoundConfig {
    grid: GridBounds,
    mode: GameMode,
    max_frames: Option<u32>,
    agents: Vec<AgentSeed>,
}

impl RoundConfig {
    /// Creates a round configuration for the given grid, ruleset, and agents.
    #[must_use]
    pub fn new(grid: GridBounds, mode: GameMode, agents: Vec<AgentSeed>) -> Self {
        Self {
            grid,
            mode,
            max_frames: None,
            agents,
        }
    }

    /// Enables the forage starvation timeout after the given frame budget.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u32) -> Self {
        self.max_frames = Some(max_frames);
        self
    }
}

/// Represents the authoritative Trailgrid round state.
#[derive(Debug)]
pub struct World {
    grid: GridBounds,
    mode: GameMode,
    max_frames: Option<u32>,
    agents: Vec<Agent>,
    food: Option<CellCoord>,
    tick: u64,
    score: u32,
    fitness: i64,
    frames_since_food: u32,
    phase: RoundPhase,
}

impl World {
    /// Creates a new world ready for simulation.
    ///
    /// Agents receive dense identifiers in seed order.
    #[must_use]
    pub fn new(config: RoundConfig) -> Self {
        let agents = config
            .agents
            .iter()
            .enumerate()
            .map(|(index, seed)| Agent::from_seed(AgentId::new(index as u32), *seed))
            .collect();

        Self {
            grid: config.grid,
            mode: config.mode,
            max_frames: config.max_frames,
            agents,
            food: None,
            tick: 0,
            score: 0,
            fitness: 0,
            frames_since_food: 0,
            phase: RoundPhase::Running,
        }
    }

    fn agent_mut(&mut self, agent: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|candidate| candidate.id == agent)
    }

    fn cell_occupied(&self, cell: CellCoord) -> bool {
        self.agents
            .iter()
            .any(|agent| agent.trail.contains(&cell))
    }

    fn conclude(&mut self, outcome: RoundOutcome, out_events: &mut Vec<Event>) {
        self.phase = RoundPhase::Ended(outcome.clone());
        out_events.push(Event::RoundEnded { outcome });
    }

    fn advance_tick(&mut self, out_events: &mut Vec<Event>) {
        self.tick = self.tick.saturating_add(1);

        if self.mode == GameMode::Forage {
            self.frames_since_food = self.frames_since_food.saturating_add(1);
            if let Some(max_frames) = self.max_frames {
                if self.frames_since_food > max_frames {
                    self.conclude(RoundOutcome::Timeout, out_events);
                    return;
                }
            }
        }

        for agent in self.agents.iter_mut() {
            agent.apply_pending_heading();
        }

        let view = snapshot_agents(&self.agents);
        let tick_resolution = resolution::resolve(self.grid, &view);

        if let Some(outcome) = resolution::conclude(&tick_resolution) {
            self.conclude(outcome, out_events);
            return;
        }

        for agent in self.agents.iter_mut() {
            let Some(Verdict::Advance(next_head)) = tick_resolution.verdict(agent.id) else {
                continue;
            };
            if self.mode == GameMode::Versus {
                // Versus trails are permanent: the tail never vacates, so
                // every clean tick extends the trail by one cell.
                agent.grow(1);
            }
            let from = agent.head();
            agent.commit_move(next_head);
            debug_assert!(
                !agent.has_duplicate_cells(),
                "agent {} trail self-overlaps after a clean commit",
                agent.id.get()
            );
            out_events.push(Event::AgentAdvanced {
                agent: agent.id,
                from,
                to: next_head,
            });
        }
        out_events.push(Event::TickAdvanced { tick: self.tick });

        if self.mode == GameMode::Forage {
            self.fitness -= 1;
        }

        self.check_consumption(out_events);
    }

    /// Runs the food check against the freshly committed heads.
    ///
    /// This must stay strictly after collision resolution and the commit:
    /// consuming food on a tick that also crashes must not register.
    fn check_consumption(&mut self, out_events: &mut Vec<Event>) {
        let Some(food) = self.food else {
            return;
        };
        let Some(agent) = self.agents.iter_mut().find(|agent| agent.head() == food) else {
            return;
        };

        agent.grow(1);
        let agent_id = agent.id;
        let pending = agent.pending_growth;
        self.score = self.score.saturating_add(1);
        self.fitness += 100;
        self.frames_since_food = 0;
        self.food = None;

        out_events.push(Event::FoodConsumed {
            agent: agent_id,
            cell: food,
        });
        out_events.push(Event::AgentGrew {
            agent: agent_id,
            pending,
        });
        out_events.push(Event::FoodSpawnNeeded);
    }

    fn place_food(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if !self.grid.contains(cell) {
            out_events.push(Event::FoodPlacementRejected {
                cell,
                reason: FoodPlacementError::OutOfBounds,
            });
            return;
        }
        if self.cell_occupied(cell) {
            out_events.push(Event::FoodPlacementRejected {
                cell,
                reason: FoodPlacementError::Occupied,
            });
            return;
        }
        if self.food.is_some() {
            out_events.push(Event::FoodPlacementRejected {
                cell,
                reason: FoodPlacementError::AlreadyPresent,
            });
            return;
        }

        self.food = Some(cell);
        out_events.push(Event::FoodPlaced { cell });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the round has ended every command is a no-op: no transition leaves a
/// terminal state.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if matches!(world.phase, RoundPhase::Ended(_)) {
        return;
    }

    match command {
        Command::StartRound => {
            out_events.push(Event::RoundStarted { mode: world.mode });
            if world.mode == GameMode::Forage && world.food.is_none() {
                out_events.push(Event::FoodSpawnNeeded);
            }
        }
        Command::SetHeading { agent, direction } => {
            if let Some(agent) = world.agent_mut(agent) {
                agent.pending_heading = Some(direction);
            }
        }
        Command::Tick => world.advance_tick(out_events),
        Command::PlaceFood { cell } => world.place_food(cell, out_events),
        Command::DeclareBoardFull => world.conclude(RoundOutcome::BoardFull, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{snapshot_agents, RoundPhase, World};
    use trailgrid_core::{AgentView, CellCoord, GameMode, GridBounds, RoundOutcome};

    /// Scoring and progress counters captured at a point in time.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct RoundSnapshot {
        /// Number of ticks completed since the round opened.
        pub tick: u64,
        /// Food items consumed so far.
        pub score: u32,
        /// Signed survival-and-feeding accumulator.
        pub fitness: i64,
        /// Ticks elapsed since food was last consumed.
        pub frames_since_food: u32,
        /// Terminal classification, or `None` while the round is running.
        pub outcome: Option<RoundOutcome>,
    }

    /// Dimensions of the playing field.
    #[must_use]
    pub fn grid(world: &World) -> GridBounds {
        world.grid
    }

    /// Ruleset the round was opened with.
    #[must_use]
    pub fn mode(world: &World) -> GameMode {
        world.mode
    }

    /// Captures an id-ordered, pre-move view of every agent.
    ///
    /// The view is derived from the trails on demand; the world keeps no
    /// separate occupancy structure that could fall out of sync.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        snapshot_agents(&world.agents)
    }

    /// Cell currently holding food, if any.
    #[must_use]
    pub fn food(world: &World) -> Option<CellCoord> {
        world.food
    }

    /// Captures the round's scoring counters and terminal state.
    #[must_use]
    pub fn round(world: &World) -> RoundSnapshot {
        RoundSnapshot {
            tick: world.tick,
            score: world.score,
            fitness: world.fitness,
            frames_since_food: world.frames_since_food,
            outcome: match &world.phase {
                RoundPhase::Running => None,
                RoundPhase::Ended(outcome) => Some(outcome.clone()),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum RoundPhase {
    Running,
    Ended(RoundOutcome),
}

#[derive(Clone, Debug)]
struct Agent {
    id: AgentId,
    trail: VecDeque<CellCoord>,
    heading: Direction,
    pending_heading: Option<Direction>,
    pending_growth: u32,
}

impl Agent {
    fn from_seed(id: AgentId, seed: AgentSeed) -> Self {
        let mut trail = VecDeque::new();
        trail.push_back(seed.cell());
        Self {
            id,
            trail,
            heading: seed.heading(),
            pending_heading: None,
            pending_growth: 0,
        }
    }

    fn head(&self) -> CellCoord {
        *self.trail.front().expect("agent trail is never empty")
    }

    /// Consumes the buffered heading intent at the start of a tick.
    ///
    /// The last intent received before the tick wins; an exact reversal of
    /// the heading actually held is silently discarded so the previous
    /// heading persists.
    fn apply_pending_heading(&mut self) {
        let Some(requested) = self.pending_heading.take() else {
            return;
        };
        if requested != self.heading.opposite() {
            self.heading = requested;
        }
    }

    /// Inserts the new head and settles queued growth; the only trail mutator.
    fn commit_move(&mut self, new_head: CellCoord) {
        self.trail.push_front(new_head);
        if self.pending_growth > 0 {
            self.pending_growth -= 1;
        } else {
            let _ = self.trail.pop_back();
        }
    }

    fn grow(&mut self, amount: u32) {
        self.pending_growth = self.pending_growth.saturating_add(amount);
    }

    fn has_duplicate_cells(&self) -> bool {
        let distinct: std::collections::HashSet<&CellCoord> = self.trail.iter().collect();
        distinct.len() != self.trail.len()
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            trail: self.trail.iter().copied().collect(),
            heading: self.heading,
            pending_growth: self.pending_growth,
        }
    }
}

fn snapshot_agents(agents: &[Agent]) -> AgentView {
    AgentView::from_snapshots(agents.iter().map(Agent::snapshot).collect())
}
