//! Agent-agent separation
//!
//! Overlapping agents that share a grid cell push each other apart along
//! the line between their centers. The push is a velocity impulse
//! proportional to the overlap depth, split by weight: escaping agents are
//! heavy so they plough back onto the mesh instead of being pushed off it
//! again.

use crate::agent::{Agent, NavState};
use crate::agent_grid::AgentGrid;
use crate::config::CrowdConfig;

/// Squared center distance under which a pair has no usable push direction
const MIN_PAIR_DISTANCE_SQ: f32 = 0.001;

fn collision_weight(agent: &Agent, config: &CrowdConfig) -> f32 {
    if agent.state == NavState::Escaping {
        config.escaping_weight
    } else {
        1.0
    }
}

/// Mutable access to two distinct agents
fn pair_mut(agents: &mut [Agent], a: usize, b: usize) -> Option<(&mut Agent, &mut Agent)> {
    if a == b || a.max(b) >= agents.len() {
        return None;
    }
    if a < b {
        let (head, tail) = agents.split_at_mut(b);
        Some((&mut head[a], &mut tail[0]))
    } else {
        let (head, tail) = agents.split_at_mut(a);
        Some((&mut tail[0], &mut head[b]))
    }
}

/// Separates overlapping agents within each grid cell.
///
/// `agents` must be indexed by the ordinals the grid was last rebuilt with.
/// Returns the number of overlapping pairs pushed apart.
pub fn update_agent_collisions(agents: &mut [Agent], grid: &AgentGrid, config: &CrowdConfig) -> usize {
    let min_distance = 2.0 * config.agent_radius;
    let mut pushed = 0;

    for cell in grid.occupied_cells() {
        if cell.len() < 2 {
            continue;
        }
        for (i, &first) in cell.iter().enumerate() {
            for &second in &cell[i + 1..] {
                let Some((a, b)) = pair_mut(agents, first as usize, second as usize) else {
                    continue;
                };
                let delta = b.position - a.position;
                let dist_sq = delta.length_squared();
                if dist_sq <= MIN_PAIR_DISTANCE_SQ || dist_sq >= min_distance * min_distance {
                    continue;
                }

                let dist = dist_sq.sqrt();
                let normal = delta / dist;
                let push = (min_distance - dist) * config.push_force;
                let (wa, wb) = (collision_weight(a, config), collision_weight(b, config));
                let total = wa + wb;
                a.velocity -= normal * push * (wb / total);
                b.velocity += normal * push * (wa / total);
                pushed += 1;
            }
        }
    }
    pushed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::Brain;
    use crate::config::AgentParams;
    use glam::Vec2;

    fn agents_at(points: &[Vec2]) -> Vec<Agent> {
        points
            .iter()
            .enumerate()
            .map(|(i, &p)| Agent::new(i as u32, p, AgentParams::default(), Brain::RandomJourney))
            .collect()
    }

    fn rebuilt_grid(config: &CrowdConfig, agents: &[Agent]) -> AgentGrid {
        let mut grid = AgentGrid::new(config);
        grid.clear_and_reindex(agents.iter().map(|a| a.position));
        grid
    }

    #[test]
    fn test_equal_weights_push_symmetrically() {
        let config = CrowdConfig::default();
        let mut agents = agents_at(&[Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)]);
        let grid = rebuilt_grid(&config, &agents);

        assert_eq!(update_agent_collisions(&mut agents, &grid, &config), 1);
        // Overlap 4 times push force 10, split evenly
        assert!((agents[0].velocity - Vec2::new(-20.0, 0.0)).length() < 1e-4);
        assert!((agents[1].velocity - Vec2::new(20.0, 0.0)).length() < 1e-4);
        assert!((agents[0].velocity + agents[1].velocity).length() < 1e-4);
    }

    #[test]
    fn test_escaping_agent_is_heavy() {
        let config = CrowdConfig::default();
        let mut agents = agents_at(&[Vec2::new(0.0, 0.0), Vec2::new(0.0, 2.0)]);
        agents[0].state = NavState::Escaping;
        let grid = rebuilt_grid(&config, &agents);

        update_agent_collisions(&mut agents, &grid, &config);
        assert!(agents[0].velocity.y < 0.0);
        assert!(agents[1].velocity.y > 0.0);
        assert!(agents[1].velocity.length() > 10.0 * agents[0].velocity.length());
    }

    #[test]
    fn test_distant_and_coincident_pairs_are_ignored() {
        let config = CrowdConfig::default();
        let mut agents = agents_at(&[Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(6.0, 0.0)]);
        let grid = rebuilt_grid(&config, &agents);

        assert_eq!(update_agent_collisions(&mut agents, &grid, &config), 0);
        assert!(agents.iter().all(|a| a.velocity == Vec2::ZERO));
    }

    #[test]
    fn test_pair_mut_rejects_aliasing() {
        let mut agents = agents_at(&[Vec2::ZERO, Vec2::ONE]);
        assert!(pair_mut(&mut agents, 1, 1).is_none());
        assert!(pair_mut(&mut agents, 0, 5).is_none());
        let (a, b) = pair_mut(&mut agents, 1, 0).unwrap();
        assert_eq!((a.id, b.id), (1, 0));
    }
}
