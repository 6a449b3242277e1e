//! Stuck statistics
//!
//! The stuck rating grows passively while an agent has corners to follow,
//! faster when it moves slowly, and on every wall contact. Progress toward
//! the next corner and corridor shrinkage pay it back; the remainder decays
//! exponentially. The navigation state machine escalates its recovery
//! actions as the rating passes the danger thresholds.

use trinav_common::lerp;

use crate::agent::Agent;
use crate::config::NavConfig;

/// Clears the stuck bookkeeping, starting a new stuck episode
pub fn reset_agent_stuck(agent: &mut Agent) {
    agent.min_corridor_length = agent.corridor.len();
    agent.last_distance_to_next_corner = f32::INFINITY;
    agent.stuck_rating = 0.0;
    agent.sight_rating = 0;
    agent.last_next_corner_tri = None;
    agent.last_end_target = agent.end_target;
}

/// Advances the stuck rating by `dt` seconds
pub fn update_agent_statistic(agent: &mut Agent, config: &NavConfig, dt: f32) {
    if dt <= 0.0 {
        return;
    }
    if agent.last_end_target != agent.end_target {
        reset_agent_stuck(agent);
    }

    if agent.num_valid_corners > 0 && agent.max_speed > 0.0 {
        let speed = agent.velocity.length().max(1.0);
        let speed_factor = speed / agent.max_speed;
        let speed_mult = lerp(2.0, 0.4, speed_factor * speed_factor * speed_factor);
        agent.stuck_rating += config.stuck_passive * dt * speed_mult;

        let dist = agent.position.distance(agent.next_corner);
        if agent.last_next_corner_tri != agent.next_corner_tri {
            agent.last_distance_to_next_corner = dist;
            agent.last_next_corner_tri = agent.next_corner_tri;
            agent.sight_rating = 0;
        }

        let progress = agent.last_distance_to_next_corner - dist;
        if progress > 0.0 {
            let mult = (2.0 - agent.params.intelligence) / agent.max_speed * config.stuck_distance;
            agent.stuck_rating -= progress / (speed * dt) * mult;
            agent.last_distance_to_next_corner = dist;
        }
    }

    if agent.corridor.len() < agent.min_corridor_length {
        let shrink = (agent.min_corridor_length - agent.corridor.len()) as f32;
        agent.stuck_rating -= shrink * config.stuck_corridor;
        agent.min_corridor_length = agent.corridor.len();
    }

    agent.stuck_rating *= config.stuck_decay.powf(dt);
    agent.stuck_rating = agent.stuck_rating.max(0.0);
}
