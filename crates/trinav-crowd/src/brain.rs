//! Agent brains
//!
//! A brain decides where an agent goes next. Brains run before the
//! navigation pass and either leave the choice to the navigation state
//! machine or set an end target themselves and queue a ready-made corridor
//! through the [`CommandBuffer`].

use std::f32::consts::TAU;

use glam::Vec2;
use trinav::{NavMesh, PolyId, TriId};
use trinav_common::{cross_2d, triangle_area, Result};

use crate::agent::{Agent, NavState};
use crate::command_buffer::{CommandBuffer, CorridorAction};
use crate::config::NavConfig;

/// Length of the exploration ray of [`Brain::WanderDir`]
pub const WANDER_RAY_LENGTH: f32 = 150.0;

/// Behavior driving an agent's destinations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Brain {
    /// Destinations come from the host only
    #[default]
    Manual,
    /// The navigation state machine picks random destinations
    RandomJourney,
    /// Walk in a random direction until a wall or the ray length, re-picking
    /// when standing or once the game time passes `end_at`
    WanderDir { end_at: f32 },
    /// Step into a neighboring polygon chosen by shared edge length
    WanderFloat,
}

/// Scratch buffers reused across brain updates
#[derive(Debug, Default)]
pub struct BrainScratch {
    tris: Vec<TriId>,
    polys: Vec<PolyId>,
    weights: Vec<f32>,
}

/// Shared state of the brain pass
pub struct BrainContext<'c> {
    pub mesh: &'c NavMesh,
    pub config: &'c NavConfig,
    pub rng: &'c mut fastrand::Rng,
    pub game_time: f32,
    pub commands: &'c mut CommandBuffer,
    pub scratch: &'c mut BrainScratch,
}

/// Runs the brain of one agent. `slot` is the agent address used in
/// queued commands.
pub fn update_brain(agent: &mut Agent, slot: u32, ctx: &mut BrainContext<'_>) -> Result<()> {
    match agent.brain {
        Brain::Manual | Brain::RandomJourney => Ok(()),
        Brain::WanderDir { end_at } => wander_dir(agent, slot, end_at, ctx),
        Brain::WanderFloat => wander_float(agent, slot, ctx),
    }
}

/// Intersection of the line through `p1 p2` with the line through `q1 q2`
fn line_intersection(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> Option<Vec2> {
    let d = p2 - p1;
    let e = q2 - q1;
    let denom = cross_2d(d, e);
    if denom.abs() < 1e-9 {
        return None;
    }
    let t = cross_2d(q1 - p1, e) / denom;
    Some(p1 + d * t)
}

/// Picks an index with probability proportional to its weight
fn pick_weighted(rng: &mut fastrand::Rng, weights: &[f32]) -> usize {
    let total: f32 = weights.iter().sum();
    let mut pick = rng.f32() * total;
    for (i, &w) in weights.iter().enumerate() {
        if pick <= w {
            return i;
        }
        pick -= w;
    }
    weights.len().saturating_sub(1)
}

fn wander_dir(agent: &mut Agent, slot: u32, end_at: f32, ctx: &mut BrainContext<'_>) -> Result<()> {
    if agent.state != NavState::Standing && ctx.game_time < end_at {
        return Ok(());
    }
    let mesh = ctx.mesh;
    agent.predicament_rating = 0;

    let angle = ctx.rng.f32() * TAU;
    let dir = Vec2::new(angle.cos(), angle.sin());
    let start = agent.position;
    let ray_end = start + dir * WANDER_RAY_LENGTH;
    let start_tri = agent.current_tri.or_else(|| mesh.get_triangle_from_point(start));

    let tris = &mut ctx.scratch.tris;
    let result = mesh.raycast_corridor(start, ray_end, start_tri, None, tris);
    let Some(&end_tri) = tris.last() else {
        return Ok(());
    };

    let polys = &mut ctx.scratch.polys;
    polys.clear();
    for poly in tris.iter().filter_map(|&t| mesh.triangle_to_polygon(t)) {
        if polys.last() != Some(&poly) {
            polys.push(poly);
        }
    }
    if polys.is_empty() {
        return Ok(());
    }

    let end = match result.hit {
        Some(hit) => line_intersection(start, ray_end, hit.edge_start, hit.edge_end)
            .map(|p| p - dir * ctx.config.corner_offset)
            .unwrap_or_else(|| mesh.triangle_centroid(end_tri)),
        None if result.partial => mesh.triangle_centroid(end_tri),
        None => ray_end,
    };

    let travel_time = end.distance(start) / agent.max_speed.max(1e-3);
    let end_at = ctx.game_time + travel_time * (0.5 + 0.5 * ctx.rng.f32());

    ctx.commands
        .write_set_corridor(slot, CorridorAction::SetAndStraightCorner, polys)?;
    agent.end_target = end;
    agent.end_target_tri = Some(end_tri);
    agent.brain = Brain::WanderDir { end_at };
    agent.state = NavState::Traveling;
    log::debug!(
        "agent {}: wandering to ({:.2}, {:.2}) until t={end_at:.2}",
        agent.id,
        end.x,
        end.y
    );
    Ok(())
}

fn wander_float(agent: &mut Agent, slot: u32, ctx: &mut BrainContext<'_>) -> Result<()> {
    if agent.state != NavState::Standing {
        return Ok(());
    }
    let mesh = ctx.mesh;
    agent.predicament_rating = 0;
    let Some(current_poly) = agent.current_tri.and_then(|t| mesh.triangle_to_polygon(t)) else {
        return Ok(());
    };

    let scratch = &mut *ctx.scratch;
    scratch.polys.clear();
    scratch.weights.clear();
    let verts = mesh.poly_verts(current_poly);
    for (i, &neighbor) in mesh.poly_neighbors(current_poly).iter().enumerate() {
        let Ok(neighbor) = PolyId::try_from(neighbor) else {
            continue;
        };
        if !mesh.is_walkable_polygon(neighbor) {
            continue;
        }
        let a = mesh.vertex(verts[i]);
        let b = mesh.vertex(verts[(i + 1) % verts.len()]);
        let width = a.distance(b);
        if width > 0.0 {
            scratch.polys.push(neighbor);
            scratch.weights.push(width);
        }
    }
    if scratch.polys.is_empty() {
        return Ok(());
    }
    let next_poly = scratch.polys[pick_weighted(ctx.rng, &scratch.weights)];

    scratch.weights.clear();
    let tris = mesh.poly_tris(next_poly);
    for t in tris.clone() {
        let [a, b, c] = mesh.triangle_points(t);
        scratch.weights.push(triangle_area(a, b, c));
    }
    if scratch.weights.iter().sum::<f32>() <= 0.0 {
        return Ok(());
    }
    let end_tri = tris.start + pick_weighted(ctx.rng, &scratch.weights) as TriId;
    let end = mesh.random_point_in_triangle(ctx.rng, end_tri);

    ctx.commands.write_set_corridor(
        slot,
        CorridorAction::SetAndStraightCorner,
        &[current_poly, next_poly],
    )?;
    agent.end_target = end;
    agent.end_target_tri = Some(end_tri);
    agent.state = NavState::Traveling;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_buffer::{SetCorridor, CMD_SET_CORRIDOR};
    use crate::config::AgentParams;
    use trinav::test_mesh_helpers::{create_islands_mesh, create_strip_mesh};

    struct Harness {
        config: NavConfig,
        rng: fastrand::Rng,
        commands: CommandBuffer,
        scratch: BrainScratch,
    }

    impl Harness {
        fn new(seed: u64) -> Self {
            let mut commands = CommandBuffer::with_capacity(256);
            commands.begin_frame();
            Self {
                config: NavConfig::default(),
                rng: fastrand::Rng::with_seed(seed),
                commands,
                scratch: BrainScratch::default(),
            }
        }

        fn run(&mut self, mesh: &NavMesh, agent: &mut Agent, game_time: f32) {
            let mut ctx = BrainContext {
                mesh,
                config: &self.config,
                rng: &mut self.rng,
                game_time,
                commands: &mut self.commands,
                scratch: &mut self.scratch,
            };
            update_brain(agent, 3, &mut ctx).unwrap();
        }

        fn commands(&mut self) -> Vec<SetCorridor> {
            self.commands.commit_frame();
            self.commands
                .reader()
                .filter(|c| c.kind == CMD_SET_CORRIDOR)
                .map(|c| SetCorridor::decode(c.payload).unwrap())
                .collect()
        }
    }

    fn agent_on(mesh: &NavMesh, position: Vec2, brain: Brain) -> Agent {
        let mut agent = Agent::new(1, position, AgentParams::default(), brain);
        agent.current_tri = mesh.get_triangle_from_point(position);
        agent
    }

    #[test]
    fn test_line_intersection() {
        let p = line_intersection(Vec2::ZERO, Vec2::new(10.0, 10.0), Vec2::new(0.0, 4.0), Vec2::new(10.0, 4.0));
        assert_eq!(p, Some(Vec2::new(4.0, 4.0)));
        assert_eq!(line_intersection(Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::new(2.0, 1.0)), None);
    }

    #[test]
    fn test_pick_weighted_respects_zero_weights() {
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..50 {
            assert_eq!(pick_weighted(&mut rng, &[0.0, 3.0, 0.0]), 1);
        }
    }

    #[test]
    fn test_passive_brains_queue_nothing() {
        let mesh = create_strip_mesh(3).unwrap();
        let mut harness = Harness::new(1);
        for brain in [Brain::Manual, Brain::RandomJourney] {
            let mut agent = agent_on(&mesh, Vec2::new(15.0, 5.0), brain);
            harness.run(&mesh, &mut agent, 0.0);
            assert_eq!(agent.state, NavState::Standing);
        }
        assert!(harness.commands().is_empty());
    }

    #[test]
    fn test_wander_float_steps_into_neighbor() {
        let mesh = create_strip_mesh(3).unwrap();
        let mut harness = Harness::new(7);
        let mut agent = agent_on(&mesh, Vec2::new(15.0, 5.0), Brain::WanderFloat);
        agent.predicament_rating = 4;
        harness.run(&mesh, &mut agent, 0.0);

        assert_eq!(agent.state, NavState::Traveling);
        assert_eq!(agent.predicament_rating, 0);
        let end_tri = agent.end_target_tri.unwrap();
        let next_poly = mesh.triangle_to_polygon(end_tri).unwrap();
        assert!(next_poly == 0 || next_poly == 2);
        assert!(mesh.point_in_triangle(agent.end_target, end_tri));

        let commands = harness.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].agent, 3);
        assert_eq!(commands[0].action, CorridorAction::SetAndStraightCorner);
        assert_eq!(commands[0].corridor, vec![1, next_poly]);
    }

    #[test]
    fn test_wander_float_waits_while_traveling_or_isolated() {
        let islands = create_islands_mesh().unwrap();
        let mut harness = Harness::new(7);
        let mut agent = agent_on(&islands, Vec2::new(5.0, 5.0), Brain::WanderFloat);
        harness.run(&islands, &mut agent, 0.0);
        assert_eq!(agent.state, NavState::Standing);

        let strip = create_strip_mesh(3).unwrap();
        let mut agent = agent_on(&strip, Vec2::new(15.0, 5.0), Brain::WanderFloat);
        agent.state = NavState::Traveling;
        harness.run(&strip, &mut agent, 0.0);
        assert!(harness.commands().is_empty());
    }

    #[test]
    fn test_wander_dir_targets_inside_the_mesh() {
        let mesh = create_strip_mesh(20).unwrap();
        let mut harness = Harness::new(11);
        let mut agent = agent_on(&mesh, Vec2::new(103.0, 4.0), Brain::WanderDir { end_at: 0.0 });
        harness.run(&mesh, &mut agent, 1.0);

        assert_eq!(agent.state, NavState::Traveling);
        let Brain::WanderDir { end_at } = agent.brain else {
            panic!("brain changed kind");
        };
        assert!(end_at > 1.0);
        assert!(mesh.is_point_in_navmesh(agent.end_target, None).is_some());

        let commands = harness.commands();
        assert_eq!(commands.len(), 1);
        let corridor = &commands[0].corridor;
        assert_eq!(corridor[0], 10);
        assert!(corridor.windows(2).all(|w| w[0] != w[1]));
        assert_eq!(
            corridor.last().copied(),
            agent.end_target_tri.and_then(|t| mesh.triangle_to_polygon(t))
        );

        // Keeps walking until the timer runs out
        let mut harness = Harness::new(12);
        harness.run(&mesh, &mut agent, end_at - 0.01);
        assert!(harness.commands().is_empty());
        harness.run(&mesh, &mut agent, end_at);
        assert_eq!(harness.commands().len(), 1);
    }
}
