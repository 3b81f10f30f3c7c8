//! Deterministic scripted steering used as the input collaborator.
//!
//! The engine never reads raw input events; this module stands in for a
//! keyboard, emitting at most one heading intent per agent per tick.

use trailgrid_core::{AgentSnapshot, AgentView, CellCoord, Command, Direction, GridBounds};

const CANDIDATE_ORDER: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

/// Emits heading intents for every agent based on the pre-tick view.
///
/// With food on the board each agent greedily closes the Manhattan distance
/// to it; otherwise agents hold their heading until the next cell would be
/// lethal and then turn. Ties break on the fixed candidate order, so the
/// same view always yields the same intents.
pub(crate) fn steer(
    grid: GridBounds,
    agents: &AgentView,
    food: Option<CellCoord>,
    out: &mut Vec<Command>,
) {
    for agent in agents.iter() {
        if let Some(direction) = choose_heading(grid, agents, agent, food) {
            if direction != agent.heading {
                out.push(Command::SetHeading {
                    agent: agent.id,
                    direction,
                });
            }
        }
    }
}

fn choose_heading(
    grid: GridBounds,
    agents: &AgentView,
    agent: &AgentSnapshot,
    food: Option<CellCoord>,
) -> Option<Direction> {
    let head = agent.head();
    let reversal = agent.heading.opposite();

    let mut best: Option<((u32, usize), Direction)> = None;
    for (rank, direction) in CANDIDATE_ORDER.into_iter().enumerate() {
        if direction == reversal {
            continue;
        }
        let Some(next) = grid.step(head, direction) else {
            continue;
        };
        if cell_is_lethal(agents, agent, next) {
            continue;
        }

        let distance = match food {
            Some(food) => next.manhattan_distance(food),
            // Without a goal, prefer holding the current heading.
            None => u32::from(direction != agent.heading),
        };
        let key = (distance, rank);
        best = Some(match best {
            Some((existing_key, existing)) if existing_key <= key => (existing_key, existing),
            _ => (key, direction),
        });
    }

    best.map(|(_, direction)| direction)
}

/// A next cell is lethal when any pre-move trail covers it.
///
/// The agent's own head is excluded since it is vacated on the same tick.
fn cell_is_lethal(agents: &AgentView, agent: &AgentSnapshot, next: CellCoord) -> bool {
    for other in agents.iter() {
        let exclude_head = other.id == agent.id;
        if other.occupied_cells(exclude_head).contains(&next) {
            return true;
        }
    }
    false
}
