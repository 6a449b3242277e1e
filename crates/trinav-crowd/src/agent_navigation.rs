//! Per-agent navigation state machine
//!
//! - **Standing**: random-journey agents pick a random destination and plan
//!   a corridor to it; other brains leave standing agents alone.
//! - **Traveling**: follow the lookahead corners, escalating through cheap
//!   raycast repairs, full repaths and finally a new destination as the
//!   stuck, frustration and predicament ratings grow.
//! - **Escaping**: head straight back to the last valid position; once on
//!   the mesh again resume the corner that was being followed or repath.

use std::fmt;

use glam::Vec2;
use trinav::NavMeshQuery;
use trinav_common::{cross_2d, rotate_towards};

use crate::agent::{Agent, NavState};
use crate::agent_statistic::reset_agent_stuck;
use crate::brain::Brain;
use crate::config::NavConfig;
use crate::frame_stats::FrameStats;
use crate::path_patching::PathPatcher;

/// Fraction of the squared max speed under which a stuck agent counts as stopped
const STOPPED_SPEED_SQ_FRACTION: f32 = 0.0025;

/// Shared state the navigation pass needs besides the agent itself
pub struct NavContext<'c, 'a> {
    pub query: &'c mut NavMeshQuery<'a>,
    pub patcher: &'c mut PathPatcher,
    pub config: &'c NavConfig,
    pub rng: &'c mut fastrand::Rng,
    pub stats: &'c mut FrameStats,
}

/// Logs a path failure, but only every `path_log_rate`-th one in a row per agent
fn log_path_failure(agent: &mut Agent, config: &NavConfig, stats: &mut FrameStats, args: fmt::Arguments<'_>) {
    stats.path_failures += 1;
    if agent.path_failures % config.path_log_rate == 0 {
        log::error!(
            "agent {} at ({:.2}, {:.2}): {} (failure #{})",
            agent.id,
            agent.position.x,
            agent.position.y,
            args,
            agent.path_failures + 1
        );
    }
    agent.path_failures += 1;
}

/// Plans a corridor from the agent to its end target and takes the first
/// lookahead corners.
///
/// On failure the previous corridor and corners are kept.
pub fn find_path_to_destination(agent: &mut Agent, ctx: &mut NavContext<'_, '_>, context: &str) -> bool {
    let mesh = ctx.query.nav_mesh();
    let config = ctx.config;
    ctx.stats.repaths += 1;

    let start_poly = agent.current_tri.and_then(|t| mesh.triangle_to_polygon(t));
    let end_poly = agent.end_target_tri.and_then(|t| mesh.triangle_to_polygon(t));
    if let Err(status) = ctx.query.find_corridor_into(
        agent.position,
        agent.end_target,
        start_poly,
        end_poly,
        &config.corridor_params(),
        &mut agent.corridor,
    ) {
        log_path_failure(agent, config, ctx.stats, format_args!("no corridor {context}: {status}"));
        return false;
    }

    match ctx
        .query
        .find_next_corner(agent.position, &agent.corridor, agent.end_target, config.corner_offset)
    {
        Ok(corners) if corners.num_valid > 0 => {
            agent.set_corners(&corners);
            agent.path_frustration = 0;
            agent.last_visible_point = agent.position;
            agent.path_failures = 0;
            true
        }
        Ok(_) => {
            log_path_failure(agent, config, ctx.stats, format_args!("no corner {context}"));
            false
        }
        Err(status) => {
            log_path_failure(agent, config, ctx.stats, format_args!("no corner {context}: {status}"));
            false
        }
    }
}

/// Raycasts to `target` and shortcuts or repairs the corridor accordingly
fn raycast_and_patch(agent: &mut Agent, ctx: &mut NavContext<'_, '_>, target: Vec2, target_tri: Option<u32>) -> bool {
    let mesh = ctx.query.nav_mesh();
    let patched = ctx
        .patcher
        .raycast_and_patch_corridor(mesh, agent, target, target_tri, ctx.config.corner_offset);
    if patched {
        ctx.stats.patches += 1;
    }
    patched
}

/// Checks whether the agent crossed the line through its two lookahead
/// corners since the last tick
fn crossed_demarcation_line(agent: &Agent) -> bool {
    if agent.num_valid_corners < 2 {
        return false;
    }
    let line = agent.next_corner - agent.next_corner2;
    let now = cross_2d(line, agent.position - agent.next_corner2);
    let before = cross_2d(line, agent.last_position - agent.next_corner2);
    now * before <= 0.0
}

/// Advances the navigation state machine of one agent by `dt` seconds
pub fn update_agent_navigation(agent: &mut Agent, ctx: &mut NavContext<'_, '_>, dt: f32) {
    let config = ctx.config;

    if agent.state == NavState::Standing || agent.predicament_rating > config.predicament_reset {
        if agent.predicament_rating > config.predicament_reset {
            log::warn!(
                "agent {}: predicament rating {} too high at ({:.2}, {:.2}), giving up on the destination",
                agent.id,
                agent.predicament_rating,
                agent.position.x,
                agent.position.y
            );
            agent.predicament_rating = 0;
            agent.state = NavState::Standing;
        }
        if matches!(agent.brain, Brain::RandomJourney) {
            start_random_journey(agent, ctx);
        }
    } else if agent.state == NavState::Traveling {
        update_traveling(agent, ctx);
    } else if agent.state == NavState::Escaping {
        update_escaping(agent, ctx);
    }

    if agent.state != NavState::Standing {
        let to_corner = agent.next_corner - agent.position;
        if to_corner.length_squared() > 0.01 {
            agent.look = rotate_towards(
                agent.look.normalize_or(Vec2::X),
                to_corner.normalize(),
                config.look_rotation_speed * dt,
            );
        }
    }
}

fn start_random_journey(agent: &mut Agent, ctx: &mut NavContext<'_, '_>) {
    if agent.current_tri.is_none() {
        return;
    }
    let mesh = ctx.query.nav_mesh();
    let Some(end_tri) = mesh.get_random_triangle_in_area(
        ctx.rng,
        ctx.config.random_destination_center,
        ctx.config.random_destination_extent,
    ) else {
        log::error!("agent {}: navmesh has no walkable triangle to travel to", agent.id);
        return;
    };

    agent.end_target = mesh.triangle_centroid(end_tri);
    agent.end_target_tri = Some(end_tri);
    agent.predicament_rating = 0;
    agent.corridor.clear();
    if find_path_to_destination(agent, ctx, "from start") {
        agent.state = NavState::Traveling;
    }
}

fn update_traveling(agent: &mut Agent, ctx: &mut NavContext<'_, '_>) {
    let mesh = ctx.query.nav_mesh();
    let config = ctx.config;

    let Some(current_tri) = agent.current_tri else {
        log::debug!("agent {}: left the navmesh, escaping", agent.id);
        agent.state = NavState::Escaping;
        agent.pre_escape_corner = agent.next_corner;
        agent.pre_escape_corner_tri = agent.next_corner_tri;
        agent.next_corner = agent.last_valid_position;
        agent.next_corner_tri = agent.last_valid_tri;
        ctx.stats.escapes += 1;
        return;
    };

    // Fresh destination without a plan yet
    if agent.corridor.is_empty() && agent.num_valid_corners == 0 {
        if !find_path_to_destination(agent, ctx, "for new destination") {
            agent.state = NavState::Standing;
            return;
        }
    }

    if agent.stuck_rating > config.stuck_danger_1 {
        let mut need_repath = false;
        if agent.sight_rating < 1 {
            agent.sight_rating += 1;
            let (corner, corner_tri) = (agent.next_corner, agent.next_corner_tri);
            if raycast_and_patch(agent, ctx, corner, corner_tri) {
                agent.stuck_rating = 0.0;
            } else {
                need_repath = true;
            }
        } else if agent.stuck_rating > config.stuck_danger_2 {
            need_repath = agent.stuck_rating > config.stuck_danger_3
                || agent.velocity.length_squared()
                    < agent.max_speed * agent.max_speed * STOPPED_SPEED_SQ_FRACTION;
        }

        if need_repath {
            log::debug!("agent {}: stuck rating {:.1}, repathing", agent.id, agent.stuck_rating);
            agent.predicament_rating += 1;
            find_path_to_destination(agent, ctx, "from stuck");
            reset_agent_stuck(agent);
        }
    }

    // Still on the planned corridor?
    if let Some(current_poly) = mesh.triangle_to_polygon(current_tri) {
        if agent.alien_poly != Some(current_poly) {
            let window = config.corridor_expected_jump.min(agent.corridor.len());
            match agent.corridor[..window].iter().position(|&p| p == current_poly) {
                Some(index) => {
                    agent.alien_poly = None;
                    if index > 0 {
                        agent.path_frustration = 0;
                        agent.corridor.drain(..index);
                    }
                }
                None => {
                    agent.path_frustration += 1;
                    if agent.path_frustration > agent.params.max_frustration {
                        agent.path_frustration = 0;
                        recover_path(agent, ctx);
                    } else {
                        agent.alien_poly = Some(current_poly);
                    }
                }
            }
        }
    }

    let dist_sq = agent.position.distance_squared(agent.next_corner);
    if agent.num_valid_corners == 2
        && (dist_sq < config.corner_offset * config.corner_offset || crossed_demarcation_line(agent))
    {
        agent.last_visible_point = agent.next_corner;
        match ctx.query.find_next_corner(
            agent.position,
            &agent.corridor,
            agent.end_target,
            config.corner_offset,
        ) {
            Ok(corners) if corners.num_valid > 0 => agent.set_corners(&corners),
            Ok(_) => {}
            Err(status) => log::debug!("agent {}: corner advance failed: {status}", agent.id),
        }
    }

    if agent.num_valid_corners == 1
        && agent.position.distance_squared(agent.end_target) < agent.params.arrival_threshold_sq
    {
        log::debug!("agent {}: arrived", agent.id);
        agent.state = NavState::Standing;
        agent.corridor.clear();
        agent.num_valid_corners = 0;
    } else if agent.num_valid_corners == 0 {
        log_path_failure(agent, config, ctx.stats, format_args!("no corner after the current one"));
    }
}

/// Repath after drifting off the corridor; close destinations fall back to a
/// straight raycast
fn recover_path(agent: &mut Agent, ctx: &mut NavContext<'_, '_>) {
    if find_path_to_destination(agent, ctx, "after path recovery") {
        return;
    }
    let (target, target_tri) = (agent.end_target, agent.end_target_tri);
    if raycast_and_patch(agent, ctx, target, target_tri) {
        agent.next_corner = target;
        agent.next_corner_tri = target_tri;
        agent.num_valid_corners = 1;
    } else {
        log_path_failure(agent, ctx.config, ctx.stats, format_args!("path recovery failed"));
    }
}

fn update_escaping(agent: &mut Agent, ctx: &mut NavContext<'_, '_>) {
    if agent.current_tri.is_none() {
        return;
    }
    log::debug!("agent {}: back on the navmesh", agent.id);
    agent.state = NavState::Traveling;

    if let Some(corner_tri) = agent.pre_escape_corner_tri {
        let corner = agent.pre_escape_corner;
        if raycast_and_patch(agent, ctx, corner, Some(corner_tri)) {
            agent.next_corner = corner;
            agent.next_corner_tri = Some(corner_tri);
            agent.pre_escape_corner = Vec2::ZERO;
            agent.pre_escape_corner_tri = None;
            return;
        }
    }

    if agent.end_target_tri.is_some() {
        find_path_to_destination(agent, ctx, "after escaping");
    } else {
        log::error!(
            "agent {}: destination ({:.2}, {:.2}) is not on the navmesh after escaping",
            agent.id,
            agent.end_target.x,
            agent.end_target.y
        );
    }
}
