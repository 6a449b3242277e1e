//! Navigation agent state

use glam::Vec2;
use trinav::{DualCorner, PolyId, TriId};

use crate::brain::Brain;
use crate::config::AgentParams;

/// Navigation state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    /// Idle, waiting for a destination
    #[default]
    Standing,
    /// Following a corridor toward the destination
    Traveling,
    /// Off the walkable mesh, heading back to the last valid position
    Escaping,
}

/// A navigating agent
///
/// Fields are public so hosts and brains can inspect and steer agents
/// directly; the crowd keeps the derived fields consistent every tick.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Stable id used in log messages
    pub id: u32,
    pub params: AgentParams,
    /// Terminal speed derived from `params`
    pub max_speed: f32,
    pub brain: Brain,
    pub state: NavState,

    pub position: Vec2,
    pub last_position: Vec2,
    pub velocity: Vec2,
    /// Acceleration applied in the last physics step
    pub last_applied_accel: Vec2,
    /// Desired velocity of the last physics step
    pub desired_velocity: Vec2,
    /// Unit facing direction
    pub look: Vec2,
    /// Walkable triangle under the agent, `None` while off-mesh
    pub current_tri: Option<TriId>,
    pub last_valid_position: Vec2,
    pub last_valid_tri: Option<TriId>,
    /// The last physics step slid along a wall
    pub wall_contact: bool,

    /// Polygon corridor, current polygon first
    pub corridor: Vec<PolyId>,
    pub next_corner: Vec2,
    pub next_corner_tri: Option<TriId>,
    pub next_corner2: Vec2,
    pub next_corner2_tri: Option<TriId>,
    /// Valid lookahead corners (0, 1 or 2)
    pub num_valid_corners: u8,
    /// Where the next corner was last known to be visible from
    pub last_visible_point: Vec2,
    pub end_target: Vec2,
    pub end_target_tri: Option<TriId>,
    pub pre_escape_corner: Vec2,
    pub pre_escape_corner_tri: Option<TriId>,
    /// Off-corridor polygon already counted toward frustration
    pub alien_poly: Option<PolyId>,

    pub path_frustration: u32,
    pub stuck_rating: f32,
    pub sight_rating: u32,
    pub predicament_rating: u32,
    pub last_distance_to_next_corner: f32,
    pub last_next_corner_tri: Option<TriId>,
    pub min_corridor_length: usize,
    pub last_end_target: Vec2,
    /// Consecutive path failures, for rate-limited logging
    pub path_failures: u32,
}

impl Agent {
    /// Creates a standing agent at `position`
    pub fn new(id: u32, position: Vec2, params: AgentParams, brain: Brain) -> Self {
        let max_speed = params.max_speed();
        Self {
            id,
            params,
            max_speed,
            brain,
            state: NavState::Standing,
            position,
            last_position: position,
            velocity: Vec2::ZERO,
            last_applied_accel: Vec2::ZERO,
            desired_velocity: Vec2::ZERO,
            look: Vec2::X,
            current_tri: None,
            last_valid_position: position,
            last_valid_tri: None,
            wall_contact: false,
            corridor: Vec::new(),
            next_corner: position,
            next_corner_tri: None,
            next_corner2: position,
            next_corner2_tri: None,
            num_valid_corners: 0,
            last_visible_point: position,
            end_target: position,
            end_target_tri: None,
            pre_escape_corner: Vec2::ZERO,
            pre_escape_corner_tri: None,
            alien_poly: None,
            path_frustration: 0,
            stuck_rating: 0.0,
            sight_rating: 0,
            predicament_rating: 0,
            last_distance_to_next_corner: f32::INFINITY,
            last_next_corner_tri: None,
            min_corridor_length: 0,
            last_end_target: position,
            path_failures: 0,
        }
    }

    /// Takes over the lookahead corners of a funnel result
    pub fn set_corners(&mut self, corners: &DualCorner) {
        self.next_corner = corners.corner1;
        self.next_corner_tri = corners.tri1;
        self.next_corner2 = corners.corner2;
        self.next_corner2_tri = corners.tri2;
        self.num_valid_corners = corners.num_valid;
    }

    /// Makes the destination the only corner
    pub fn set_straight_corner(&mut self) {
        self.next_corner = self.end_target;
        self.next_corner_tri = self.end_target_tri;
        self.num_valid_corners = 1;
        self.path_frustration = 0;
        self.last_visible_point = self.position;
    }

    /// Sets the destination; the agent plans a path on its next navigation tick
    pub fn set_destination(&mut self, target: Vec2, target_tri: TriId) {
        self.end_target = target;
        self.end_target_tri = Some(target_tri);
        self.predicament_rating = 0;
        self.corridor.clear();
        self.num_valid_corners = 0;
        self.state = NavState::Traveling;
    }

    /// Checks whether the agent is on its way somewhere
    pub fn is_moving(&self) -> bool {
        self.state != NavState::Standing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_is_standing() {
        let agent = Agent::new(1, Vec2::new(3.0, 4.0), AgentParams::walker(), Brain::RandomJourney);
        assert_eq!(agent.state, NavState::Standing);
        assert!(!agent.is_moving());
        assert_eq!(agent.current_tri, None);
        assert_eq!(agent.num_valid_corners, 0);
        assert_eq!(agent.max_speed, AgentParams::walker().max_speed());
    }

    #[test]
    fn test_set_corners_copies_both_lookaheads() {
        let mut agent = Agent::new(1, Vec2::ZERO, AgentParams::default(), Brain::RandomJourney);
        let corners = DualCorner {
            corner1: Vec2::new(1.0, 0.0),
            tri1: Some(2),
            corner2: Vec2::new(5.0, 5.0),
            tri2: Some(3),
            num_valid: 2,
            ..Default::default()
        };
        agent.set_corners(&corners);
        assert_eq!(agent.next_corner, Vec2::new(1.0, 0.0));
        assert_eq!(agent.next_corner2_tri, Some(3));
        assert_eq!(agent.num_valid_corners, 2);
    }
}
