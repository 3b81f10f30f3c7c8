#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simultaneous collision resolver for agent movement.
//!
//! Every agent's next head is computed from a single pre-move snapshot
//! before any collision class is evaluated. Resolving agents one at a time
//! while mutating state between checks misclassifies same-tick position
//! swaps and head-on crashes, so no entry point here takes mutable state.

use std::collections::HashSet;

use trailgrid_core::{AgentId, AgentView, CellCoord, CrashCause, GridBounds, RoundOutcome};

/// Per-agent result of resolving one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The agent moves cleanly into the given cell.
    Advance(CellCoord),
    /// The agent crashes this tick for the given reason.
    Crashed(CrashCause),
}

/// Complete classification of one tick, ordered by agent identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickResolution {
    verdicts: Vec<(AgentId, Verdict)>,
}

impl TickResolution {
    /// Iterator over the per-agent verdicts in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &(AgentId, Verdict)> {
        self.verdicts.iter()
    }

    /// Looks up the verdict assigned to a specific agent.
    #[must_use]
    pub fn verdict(&self, agent: AgentId) -> Option<Verdict> {
        self.verdicts
            .iter()
            .find(|(id, _)| *id == agent)
            .map(|(_, verdict)| *verdict)
    }

    /// Collects every crashed agent paired with its collision class.
    #[must_use]
    pub fn crashed(&self) -> Vec<(AgentId, CrashCause)> {
        self.verdicts
            .iter()
            .filter_map(|(id, verdict)| match verdict {
                Verdict::Crashed(cause) => Some((*id, *cause)),
                Verdict::Advance(_) => None,
            })
            .collect()
    }

    /// Reports whether every agent advances cleanly this tick.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.verdicts
            .iter()
            .all(|(_, verdict)| matches!(verdict, Verdict::Advance(_)))
    }
}

/// Resolves one tick of movement for every agent in the view.
///
/// Collision classes are evaluated with fixed precedence: wall, then own
/// trail (excluding the head cell being vacated), then opponent trails
/// (heads included), and finally head-on grouping among the agents that
/// passed every earlier test. All tests run against pre-move trails.
#[must_use]
pub fn resolve(grid: GridBounds, agents: &AgentView) -> TickResolution {
    let mut verdicts: Vec<(AgentId, Verdict)> = Vec::with_capacity(agents.len());

    for agent in agents.iter() {
        let Some(next_head) = agent.peek_next_head(grid) else {
            verdicts.push((agent.id, Verdict::Crashed(CrashCause::Wall)));
            continue;
        };

        if agent.occupied_cells(true).contains(&next_head) {
            verdicts.push((agent.id, Verdict::Crashed(CrashCause::OwnTrail)));
            continue;
        }

        let hits_opponent = agents
            .iter()
            .filter(|other| other.id != agent.id)
            .any(|other| other.occupied_cells(false).contains(&next_head));
        if hits_opponent {
            verdicts.push((agent.id, Verdict::Crashed(CrashCause::OpponentTrail)));
            continue;
        }

        verdicts.push((agent.id, Verdict::Advance(next_head)));
    }

    mark_head_on_crashes(&mut verdicts);
    TickResolution { verdicts }
}

/// Aggregates a resolution into a terminal outcome, if the tick ends the round.
///
/// Zero crashed agents leave the round running. A single crashed agent loses
/// with the cause that triggered; two or more crashed agents, head-on cases
/// included, draw the round.
#[must_use]
pub fn conclude(resolution: &TickResolution) -> Option<RoundOutcome> {
    let crashed = resolution.crashed();
    match crashed.len() {
        0 => None,
        1 => {
            let (agent, cause) = crashed[0];
            Some(RoundOutcome::Loss { agent, cause })
        }
        _ => Some(RoundOutcome::Draw { crashed }),
    }
}

/// Upgrades otherwise-clean agents sharing a next head to head-on crashes.
///
/// Agents already crashed by the wall, self, or opponent tests keep their
/// verdicts; a head-on only triggers between agents that would otherwise
/// have moved cleanly into the same cell.
fn mark_head_on_crashes(verdicts: &mut [(AgentId, Verdict)]) {
    let mut contested: HashSet<CellCoord> = HashSet::new();
    let mut seen: HashSet<CellCoord> = HashSet::new();

    for (_, verdict) in verdicts.iter() {
        if let Verdict::Advance(cell) = verdict {
            if !seen.insert(*cell) {
                let _ = contested.insert(*cell);
            }
        }
    }

    if contested.is_empty() {
        return;
    }

    for (_, verdict) in verdicts.iter_mut() {
        if let Verdict::Advance(cell) = verdict {
            if contested.contains(cell) {
                *verdict = Verdict::Crashed(CrashCause::HeadOn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailgrid_core::{AgentSnapshot, Direction};

    fn snapshot(id: u32, trail: Vec<CellCoord>, heading: Direction) -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId::new(id),
            trail,
            heading,
            pending_growth: 0,
        }
    }

    #[test]
    fn lone_agent_advances_on_open_ground() {
        let grid = GridBounds::new(10, 10);
        let view = AgentView::from_snapshots(vec![snapshot(
            0,
            vec![CellCoord::new(4, 4)],
            Direction::East,
        )]);

        let resolution = resolve(grid, &view);
        assert!(resolution.is_clean());
        assert_eq!(
            resolution.verdict(AgentId::new(0)),
            Some(Verdict::Advance(CellCoord::new(5, 4)))
        );
        assert_eq!(conclude(&resolution), None);
    }

    #[test]
    fn wall_crash_is_detected_before_any_mutation() {
        let grid = GridBounds::new(10, 10);
        let view = AgentView::from_snapshots(vec![snapshot(
            0,
            vec![CellCoord::new(0, 5)],
            Direction::West,
        )]);

        let resolution = resolve(grid, &view);
        assert_eq!(
            resolution.verdict(AgentId::new(0)),
            Some(Verdict::Crashed(CrashCause::Wall))
        );
        assert_eq!(
            conclude(&resolution),
            Some(RoundOutcome::Loss {
                agent: AgentId::new(0),
                cause: CrashCause::Wall,
            })
        );
    }

    #[test]
    fn self_test_excludes_the_vacated_head_cell() {
        let grid = GridBounds::new(10, 10);
        // U-shaped trail whose head is about to close onto its own body.
        let view = AgentView::from_snapshots(vec![snapshot(
            0,
            vec![
                CellCoord::new(4, 5),
                CellCoord::new(4, 4),
                CellCoord::new(5, 4),
                CellCoord::new(5, 5),
                CellCoord::new(5, 6),
            ],
            Direction::East,
        )]);

        let resolution = resolve(grid, &view);
        assert_eq!(
            resolution.verdict(AgentId::new(0)),
            Some(Verdict::Crashed(CrashCause::OwnTrail))
        );
    }

    #[test]
    fn moving_into_own_tail_cell_still_crashes() {
        let grid = GridBounds::new(10, 10);
        // 2x2 loop: the next head lands on the tail cell, which the body
        // test includes even though the tail would vacate on a non-growing
        // commit.
        let view = AgentView::from_snapshots(vec![snapshot(
            0,
            vec![
                CellCoord::new(4, 5),
                CellCoord::new(5, 5),
                CellCoord::new(5, 4),
                CellCoord::new(4, 4),
            ],
            Direction::North,
        )]);

        let resolution = resolve(grid, &view);
        assert_eq!(
            resolution.verdict(AgentId::new(0)),
            Some(Verdict::Crashed(CrashCause::OwnTrail))
        );
    }

    #[test]
    fn opponent_trail_crash_uses_pre_move_occupancy() {
        let grid = GridBounds::new(10, 10);
        let runner = snapshot(0, vec![CellCoord::new(3, 3)], Direction::East);
        let blocker = snapshot(
            1,
            vec![CellCoord::new(4, 2), CellCoord::new(4, 3), CellCoord::new(4, 4)],
            Direction::North,
        );
        let view = AgentView::from_snapshots(vec![runner, blocker]);

        let resolution = resolve(grid, &view);
        assert_eq!(
            resolution.verdict(AgentId::new(0)),
            Some(Verdict::Crashed(CrashCause::OpponentTrail))
        );
    }

    #[test]
    fn same_tick_position_swap_crashes_both_agents() {
        let grid = GridBounds::new(10, 10);
        let left = snapshot(0, vec![CellCoord::new(4, 4)], Direction::East);
        let right = snapshot(1, vec![CellCoord::new(5, 4)], Direction::West);
        let view = AgentView::from_snapshots(vec![left, right]);

        let resolution = resolve(grid, &view);
        assert_eq!(
            resolution.verdict(AgentId::new(0)),
            Some(Verdict::Crashed(CrashCause::OpponentTrail))
        );
        assert_eq!(
            resolution.verdict(AgentId::new(1)),
            Some(Verdict::Crashed(CrashCause::OpponentTrail))
        );
        assert!(matches!(
            conclude(&resolution),
            Some(RoundOutcome::Draw { crashed }) if crashed.len() == 2
        ));
    }

    #[test]
    fn shared_next_head_draws_regardless_of_agent_order() {
        let grid = GridBounds::new(10, 10);
        let east_bound = snapshot(0, vec![CellCoord::new(4, 5)], Direction::East);
        let west_bound = snapshot(1, vec![CellCoord::new(6, 5)], Direction::West);

        let forward = resolve(
            grid,
            &AgentView::from_snapshots(vec![east_bound.clone(), west_bound.clone()]),
        );
        let reversed = resolve(grid, &AgentView::from_snapshots(vec![west_bound, east_bound]));

        assert_eq!(forward, reversed);
        assert_eq!(
            forward.verdict(AgentId::new(0)),
            Some(Verdict::Crashed(CrashCause::HeadOn))
        );
        assert_eq!(
            forward.verdict(AgentId::new(1)),
            Some(Verdict::Crashed(CrashCause::HeadOn))
        );
        assert!(matches!(
            conclude(&forward),
            Some(RoundOutcome::Draw { .. })
        ));
    }

    #[test]
    fn wall_crash_takes_precedence_over_head_on_grouping() {
        let grid = GridBounds::new(10, 10);
        // Agent 0 steps off the east edge; agent 1 steps into the cell agent
        // 0 would have entered were the grid one column wider. Only agent 1
        // remains in the head-on pool, so it advances cleanly and agent 0
        // alone decides the outcome.
        let falling = snapshot(0, vec![CellCoord::new(9, 5)], Direction::East);
        let chasing = snapshot(1, vec![CellCoord::new(8, 5)], Direction::East);
        let view = AgentView::from_snapshots(vec![falling, chasing]);

        let resolution = resolve(grid, &view);
        assert_eq!(
            resolution.verdict(AgentId::new(0)),
            Some(Verdict::Crashed(CrashCause::Wall))
        );
        assert_eq!(
            resolution.verdict(AgentId::new(1)),
            Some(Verdict::Advance(CellCoord::new(9, 5)))
        );
        assert_eq!(
            conclude(&resolution),
            Some(RoundOutcome::Loss {
                agent: AgentId::new(0),
                cause: CrashCause::Wall,
            })
        );
    }

    #[test]
    fn simultaneous_wall_crashes_draw_the_round() {
        let grid = GridBounds::new(10, 10);
        let north_runner = snapshot(0, vec![CellCoord::new(3, 0)], Direction::North);
        let south_runner = snapshot(1, vec![CellCoord::new(3, 9)], Direction::South);
        let view = AgentView::from_snapshots(vec![north_runner, south_runner]);

        let resolution = resolve(grid, &view);
        assert_eq!(
            conclude(&resolution),
            Some(RoundOutcome::Draw {
                crashed: vec![
                    (AgentId::new(0), CrashCause::Wall),
                    (AgentId::new(1), CrashCause::Wall),
                ],
            })
        );
    }

    #[test]
    fn three_way_head_on_crashes_every_contender() {
        let grid = GridBounds::new(10, 10);
        let view = AgentView::from_snapshots(vec![
            snapshot(0, vec![CellCoord::new(4, 5)], Direction::East),
            snapshot(1, vec![CellCoord::new(6, 5)], Direction::West),
            snapshot(2, vec![CellCoord::new(5, 4)], Direction::South),
        ]);

        let resolution = resolve(grid, &view);
        for id in 0..3 {
            assert_eq!(
                resolution.verdict(AgentId::new(id)),
                Some(Verdict::Crashed(CrashCause::HeadOn)),
                "agent {id} should crash head-on"
            );
        }
    }
}
