//! Steering and movement integration
//!
//! Each tick the agent accelerates toward a desired velocity aimed at its
//! next corner, loses speed to resistance and moves. Moves that would cross
//! a wall are deflected along it instead; escaping agents beeline back to
//! their last valid position without wall checks.

use glam::Vec2;
use trinav::NavMesh;
use trinav_common::{cvt, lerp};

use crate::agent::{Agent, NavState};
use crate::config::NavConfig;

/// Squared speed under which the velocity snaps to zero
const REST_SPEED_SQ: f32 = 0.001;

/// Distance to the corner under which there is no steering direction
const MIN_CORNER_DISTANCE: f32 = 0.01;

/// The wall raycast looks this far beyond the move
const WALL_PROBE_DISTANCE: f32 = 0.45;

/// Share of the into-wall velocity removed on contact; above 1 bounces
/// the agent slightly off the wall
const WALL_DEFLECTION: f32 = 1.45;

/// Moves shorter than this (squared) skip the wall raycast
const MIN_MOVE_SQ: f32 = 1e-4;

/// Speed the agent wants this tick, before resistance compensation
fn desired_speed(agent: &Agent, dist_to_corner: f32) -> f32 {
    if !matches!(agent.state, NavState::Traveling | NavState::Escaping) {
        return 0.0;
    }
    let params = &agent.params;
    let slow_strength =
        1.0 / 8.0 / (params.resistance * params.resistance) * lerp(0.5, 2.0, params.intelligence);
    let mut slow_distance = agent.max_speed * 0.25;
    let mut slow_speed = agent.max_speed;

    if dist_to_corner < slow_distance && agent.num_valid_corners >= 2 {
        // Sharp turns brake early and hard, straight continuations barely
        let turn = (agent.next_corner2 - agent.next_corner).normalize_or_zero();
        let alignment = (agent.velocity.normalize_or_zero().dot(turn) + 1.0) * 0.5;
        let alignment = alignment * alignment * alignment;
        slow_distance *= lerp(1.0, 0.0, alignment);
        slow_speed *= lerp(slow_strength, 1.0, alignment);
    }

    if dist_to_corner > slow_distance {
        agent.max_speed
    } else {
        let min_speed = if agent.num_valid_corners == 1 {
            params.arrival_desired_speed * agent.max_speed
        } else {
            slow_speed
        };
        lerp(min_speed, agent.max_speed, dist_to_corner / slow_distance)
    }
}

/// Integrates steering and movement of one agent over `dt` seconds and
/// refreshes its triangle.
pub fn update_agent_physics(agent: &mut Agent, mesh: &NavMesh, config: &NavConfig, dt: f32) {
    agent.last_position = agent.position;
    if agent.velocity.length_squared() < REST_SPEED_SQ {
        agent.velocity = Vec2::ZERO;
    }

    let frame_resistance = (1.0 - agent.params.resistance).powf(dt);

    let to_corner = agent.next_corner - agent.position;
    let dist_to_corner = to_corner.length();
    let direction = if dist_to_corner > MIN_CORNER_DISTANCE {
        to_corner / dist_to_corner
    } else {
        Vec2::ZERO
    };

    let mut magnitude = desired_speed(agent, dist_to_corner) / frame_resistance;
    let stuck_factor = agent.stuck_rating / config.stuck_danger_2;
    magnitude *= cvt(stuck_factor * stuck_factor, 0.0, 1.0, 1.0, 0.5);
    let desired = direction * magnitude;
    agent.desired_velocity = desired;

    // Intelligence blends "push along the corner direction" with
    // "correct the whole velocity error"
    let intelligence = if desired.length_squared() > 0.1 {
        agent.params.intelligence
    } else {
        1.0
    };
    let along = direction * (magnitude - agent.velocity.dot(direction)) * (1.0 - intelligence);
    let accel = (along + (desired - agent.velocity) * intelligence)
        .clamp_length_max(agent.params.accel * dt);

    agent.last_applied_accel = if dt > 1e-4 { accel / dt } else { Vec2::ZERO };
    agent.velocity = (agent.velocity + accel) * frame_resistance;

    let step = agent.velocity * dt;
    if agent.state == NavState::Escaping {
        if step.length_squared() >= agent.next_corner.distance_squared(agent.position) {
            agent.position = agent.last_valid_position;
            agent.velocity = Vec2::ZERO;
        } else {
            agent.position += step;
        }
    } else if dt > 0.0 && step.length_squared() > MIN_MOVE_SQ {
        move_with_wall_slide(agent, mesh, config, step, dt);
    }

    match mesh.is_point_in_navmesh(agent.position, agent.current_tri) {
        Some(tri) => {
            agent.current_tri = Some(tri);
            agent.last_valid_position = agent.position;
            agent.last_valid_tri = Some(tri);
        }
        None => agent.current_tri = None,
    }
}

fn move_with_wall_slide(agent: &mut Agent, mesh: &NavMesh, config: &NavConfig, step: Vec2, dt: f32) {
    let end = agent.position + step;
    let heading = agent.velocity.normalize_or_zero();
    let probe = end + heading * WALL_PROBE_DISTANCE;

    let hit = mesh
        .raycast_point(agent.position, probe, agent.current_tri, None)
        .hit
        .filter(|hit| !hit.is_off_mesh());
    let Some(hit) = hit else {
        agent.wall_contact = false;
        agent.position = end;
        return;
    };

    agent.wall_contact = true;
    agent.stuck_rating += config.stuck_hit_wall;

    let wall = hit.edge_dir();
    let mut normal = Vec2::new(-wall.y, wall.x).normalize_or_zero();
    if normal.dot(heading) > 0.0 {
        normal = -normal;
    }
    agent.velocity -= normal * agent.velocity.dot(normal) * WALL_DEFLECTION;
    agent.position += agent.velocity * dt;
}
