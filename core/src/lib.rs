#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Trailgrid engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Ruleset selected for a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Single-agent foraging: food consumption, growth, starvation timeout.
    Forage,
    /// Multi-agent duel: opponent-trail and head-on collisions decide the round.
    Versus,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Opens the round and prompts the initial food placement in forage mode.
    StartRound,
    /// Buffers a heading intent for an agent; the last intent before a tick wins.
    SetHeading {
        /// Agent whose heading should change.
        agent: AgentId,
        /// Requested direction of travel.
        direction: Direction,
    },
    /// Advances the simulation by exactly one step for every agent.
    Tick,
    /// Places the consumable food item at the provided cell.
    PlaceFood {
        /// Cell the food should occupy.
        cell: CellCoord,
    },
    /// Reports that no free cell remains for food, ending the round.
    DeclareBoardFull,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the round opened under the given ruleset.
    RoundStarted {
        /// Ruleset active for the round.
        mode: GameMode,
    },
    /// Indicates that the simulation advanced one step.
    TickAdvanced {
        /// Number of ticks completed since the round started.
        tick: u64,
    },
    /// Confirms that an agent moved between two cells.
    AgentAdvanced {
        /// Identifier of the agent that advanced.
        agent: AgentId,
        /// Cell the agent's head occupied before moving.
        from: CellCoord,
        /// Cell the agent's head occupies after the move.
        to: CellCoord,
    },
    /// Confirms that an agent queued additional length.
    AgentGrew {
        /// Identifier of the growing agent.
        agent: AgentId,
        /// Growth ticks still pending after the increment.
        pending: u32,
    },
    /// Confirms that an agent's head reached the food cell.
    FoodConsumed {
        /// Agent that consumed the food.
        agent: AgentId,
        /// Cell the food occupied.
        cell: CellCoord,
    },
    /// Requests that the spawning system select a new food cell.
    FoodSpawnNeeded,
    /// Confirms that food was placed at a cell.
    FoodPlaced {
        /// Cell the food now occupies.
        cell: CellCoord,
    },
    /// Reports that a food placement request was rejected.
    FoodPlacementRejected {
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: FoodPlacementError,
    },
    /// Announces that the round reached a terminal state.
    RoundEnded {
        /// Terminal classification of the round.
        outcome: RoundOutcome,
    },
}

/// Reasons a food placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodPlacementError {
    /// The requested cell lies outside the configured grid.
    OutOfBounds,
    /// The requested cell is covered by an agent trail.
    Occupied,
    /// A food item is already on the board.
    AlreadyPresent,
}

/// Classifies what an agent's next head collided with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrashCause {
    /// The next head left the grid.
    Wall,
    /// The next head entered the agent's own trail.
    OwnTrail,
    /// The next head entered another agent's trail.
    OpponentTrail,
    /// Two or more agents computed the same next head.
    HeadOn,
}

/// Terminal classification of a finished round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// Exactly one agent crashed; that agent lost the round.
    Loss {
        /// Agent identified as the loser.
        agent: AgentId,
        /// Collision class that ended the round.
        cause: CrashCause,
    },
    /// Two or more agents crashed on the same tick.
    Draw {
        /// Every crashed agent paired with its collision class.
        crashed: Vec<(AgentId, CrashCause)>,
    },
    /// A foraging agent exceeded the configured frames without food.
    Timeout,
    /// No free cell remained for food; the board is fully occupied.
    BoardFull,
}

/// Cardinal movement directions available to agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Returns the direction pointing exactly opposite to this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// Unique identifier assigned to an agent.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Immutable dimensions of the playing field measured in grid cells.
///
/// The grid holds no per-cell state; occupancy is always derived from agent
/// trails so there is a single source of truth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    columns: u32,
    rows: u32,
}

impl GridBounds {
    /// Creates grid bounds with the provided column and row counts.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells contained in the grid.
    #[must_use]
    pub const fn cell_count(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Computes the neighboring cell one step in the given direction.
    ///
    /// Returns `None` when the step would leave the grid on any edge, which
    /// is how an out-of-bounds move is represented with unsigned coordinates.
    #[must_use]
    pub fn step(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let next = match direction {
            Direction::North => CellCoord::new(cell.column(), cell.row().checked_sub(1)?),
            Direction::East => CellCoord::new(cell.column().checked_add(1)?, cell.row()),
            Direction::South => CellCoord::new(cell.column(), cell.row().checked_add(1)?),
            Direction::West => CellCoord::new(cell.column().checked_sub(1)?, cell.row()),
        };
        self.contains(next).then_some(next)
    }
}

/// Immutable pre-move capture of a single agent used by systems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Cells occupied by the agent, head first, oldest cell last.
    pub trail: Vec<CellCoord>,
    /// Direction the agent will travel on the next tick.
    pub heading: Direction,
    /// Ticks for which the tail is retained to realize queued growth.
    pub pending_growth: u32,
}

impl AgentSnapshot {
    /// Head cell the agent currently occupies.
    ///
    /// The trail is never empty; an agent always occupies at least the cell
    /// it was seeded with.
    #[must_use]
    pub fn head(&self) -> CellCoord {
        self.trail[0]
    }

    /// Computes the cell the head would enter on the next tick.
    ///
    /// Pure and idempotent: repeated calls without a committed move return
    /// the same cell. `None` signals that the move leaves the grid.
    #[must_use]
    pub fn peek_next_head(&self, grid: GridBounds) -> Option<CellCoord> {
        grid.step(self.head(), self.heading)
    }

    /// Collects the agent's occupied cells as a value set for membership tests.
    ///
    /// With `exclude_head` the head cell is omitted, since that is the cell
    /// the agent vacates on the tick being evaluated.
    #[must_use]
    pub fn occupied_cells(&self, exclude_head: bool) -> HashSet<CellCoord> {
        let skip = usize::from(exclude_head);
        self.trail.iter().skip(skip).copied().collect()
    }
}

/// Read-only, id-ordered view of every agent in the round.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured agent snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Number of agents captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Looks up the snapshot for a specific agent.
    #[must_use]
    pub fn snapshot(&self, agent: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&agent, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AgentId, AgentSnapshot, AgentView, CellCoord, CrashCause, Direction, GridBounds,
        RoundOutcome,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn opposite_is_an_involution() {
        for direction in [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ] {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.opposite(), direction);
        }
    }

    #[test]
    fn step_stays_inside_the_grid() {
        let grid = GridBounds::new(3, 3);
        let center = CellCoord::new(1, 1);
        assert_eq!(
            grid.step(center, Direction::North),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(
            grid.step(center, Direction::East),
            Some(CellCoord::new(2, 1))
        );
        assert_eq!(grid.step(CellCoord::new(0, 1), Direction::West), None);
        assert_eq!(grid.step(CellCoord::new(1, 0), Direction::North), None);
        assert_eq!(grid.step(CellCoord::new(2, 1), Direction::East), None);
        assert_eq!(grid.step(CellCoord::new(1, 2), Direction::South), None);
    }

    #[test]
    fn peek_next_head_is_idempotent() {
        let grid = GridBounds::new(10, 10);
        let snapshot = AgentSnapshot {
            id: AgentId::new(0),
            trail: vec![CellCoord::new(4, 4)],
            heading: Direction::East,
            pending_growth: 0,
        };
        let first = snapshot.peek_next_head(grid);
        let second = snapshot.peek_next_head(grid);
        assert_eq!(first, Some(CellCoord::new(5, 4)));
        assert_eq!(first, second);
    }

    #[test]
    fn occupied_cells_can_exclude_the_head() {
        let snapshot = AgentSnapshot {
            id: AgentId::new(0),
            trail: vec![
                CellCoord::new(3, 3),
                CellCoord::new(2, 3),
                CellCoord::new(1, 3),
            ],
            heading: Direction::East,
            pending_growth: 0,
        };

        let full = snapshot.occupied_cells(false);
        assert_eq!(full.len(), 3);
        assert!(full.contains(&CellCoord::new(3, 3)));

        let body = snapshot.occupied_cells(true);
        assert_eq!(body.len(), 2);
        assert!(!body.contains(&CellCoord::new(3, 3)));
        assert!(body.contains(&CellCoord::new(2, 3)));
    }

    #[test]
    fn agent_view_orders_snapshots_by_id() {
        let later = AgentSnapshot {
            id: AgentId::new(7),
            trail: vec![CellCoord::new(0, 0)],
            heading: Direction::East,
            pending_growth: 0,
        };
        let earlier = AgentSnapshot {
            id: AgentId::new(2),
            trail: vec![CellCoord::new(5, 5)],
            heading: Direction::West,
            pending_growth: 0,
        };

        let view = AgentView::from_snapshots(vec![later, earlier]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![2, 7]);
        assert!(view.snapshot(AgentId::new(7)).is_some());
        assert!(view.snapshot(AgentId::new(3)).is_none());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn agent_id_round_trips_through_bincode() {
        assert_round_trip(&AgentId::new(42));
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        assert_round_trip(&CellCoord::new(5, 7));
    }

    #[test]
    fn round_outcome_round_trips_through_bincode() {
        assert_round_trip(&RoundOutcome::Loss {
            agent: AgentId::new(1),
            cause: CrashCause::Wall,
        });
        assert_round_trip(&RoundOutcome::Draw {
            crashed: vec![
                (AgentId::new(0), CrashCause::HeadOn),
                (AgentId::new(1), CrashCause::HeadOn),
            ],
        });
        assert_round_trip(&RoundOutcome::Timeout);
        assert_round_trip(&RoundOutcome::BoardFull);
    }
}
