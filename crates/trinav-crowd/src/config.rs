//! Configuration for agent navigation, locomotion and the crowd driver

use glam::Vec2;
use trinav::CorridorSearchParams;
use trinav_common::{Error, Result};

/// Tuning constants of the navigation state machine and stuck statistics
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct NavConfig {
    /// Distance corners are pushed away from obstacle vertices
    pub corner_offset: f32,
    /// Lateral distance from the straight line the corridor search does not penalize
    pub path_free_width: f32,
    /// Weight of the corridor search straying penalty
    pub path_stray_multiplier: f32,

    /// Passive stuck growth per second while following corners
    pub stuck_passive: f32,
    /// Stuck reduction per unit of progress toward the next corner
    pub stuck_distance: f32,
    /// Stuck reduction per polygon the corridor shrinks by
    pub stuck_corridor: f32,
    /// Fraction of the stuck rating kept after one second
    pub stuck_decay: f32,
    /// Stuck added on every wall contact
    pub stuck_hit_wall: f32,
    /// Above this a cheap raycast patch toward the corner is tried
    pub stuck_danger_1: f32,
    /// Above this a slow agent repaths
    pub stuck_danger_2: f32,
    /// Above this the agent always repaths
    pub stuck_danger_3: f32,

    /// Repaths after which the destination is picked again
    pub predicament_reset: u32,
    /// How far into the corridor the current polygon is looked for
    pub corridor_expected_jump: usize,
    /// Look direction turn rate in radians per second
    pub look_rotation_speed: f32,
    /// Only every n-th repeated path failure of an agent is logged
    pub path_log_rate: u32,

    /// Center of the area random destinations are picked in
    pub random_destination_center: Vec2,
    /// Half size of that area in triangle-index cells
    pub random_destination_extent: u32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            corner_offset: 2.2,
            path_free_width: trinav::DEFAULT_PATH_FREE_WIDTH,
            path_stray_multiplier: trinav::DEFAULT_PATH_STRAY_MULTIPLIER,
            stuck_passive: 14.0,
            stuck_distance: 18.0,
            stuck_corridor: 40.0,
            stuck_decay: 0.8,
            stuck_hit_wall: 5.0,
            stuck_danger_1: 35.0,
            stuck_danger_2: 45.0,
            stuck_danger_3: 75.0,
            predicament_reset: 7,
            corridor_expected_jump: 5,
            look_rotation_speed: 6.0,
            path_log_rate: 3,
            random_destination_center: Vec2::ZERO,
            random_destination_extent: 30,
        }
    }
}

impl NavConfig {
    /// Corridor search parameters derived from this configuration
    pub fn corridor_params(&self) -> CorridorSearchParams {
        CorridorSearchParams {
            free_width: self.path_free_width,
            stray_multiplier: self.path_stray_multiplier,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.corner_offset < 0.0 {
            return Err(Error::Config("corner offset must not be negative".to_string()));
        }
        if self.path_free_width < 0.0 || self.path_stray_multiplier < 0.0 {
            return Err(Error::Config(
                "corridor search shaping must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.stuck_decay) {
            return Err(Error::Config(format!(
                "stuck decay {} outside [0, 1]",
                self.stuck_decay
            )));
        }
        if !(self.stuck_danger_1 <= self.stuck_danger_2 && self.stuck_danger_2 <= self.stuck_danger_3)
        {
            return Err(Error::Config(
                "stuck danger thresholds must be ascending".to_string(),
            ));
        }
        if self.corridor_expected_jump == 0 {
            return Err(Error::Config(
                "corridor expected jump must be at least 1".to_string(),
            ));
        }
        if self.look_rotation_speed <= 0.0 {
            return Err(Error::Config("look rotation speed must be positive".to_string()));
        }
        if self.path_log_rate == 0 {
            return Err(Error::Config("path log rate must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Per-agent locomotion and steering parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct AgentParams {
    /// Maximum acceleration
    pub accel: f32,
    /// Fraction of velocity lost per second, in [0, 1]
    pub resistance: f32,
    /// Off-corridor ticks tolerated before a repath
    pub max_frustration: u32,
    /// 0 accelerates straight at the corner, 1 corrects the velocity deficit
    pub intelligence: f32,
    /// Fraction of max speed kept when arriving at the destination
    pub arrival_desired_speed: f32,
    /// Squared distance to the destination that counts as arrived
    pub arrival_threshold_sq: f32,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self::smart_walker()
    }
}

impl AgentParams {
    /// Slippery walker that overshoots corners and stops loosely
    pub fn walker() -> Self {
        Self {
            accel: 500.0,
            resistance: 0.99,
            max_frustration: 4,
            intelligence: 0.0,
            arrival_desired_speed: 0.05,
            arrival_threshold_sq: 25.0,
        }
    }

    /// Walker that brakes for turns and arrives precisely
    pub fn smart_walker() -> Self {
        Self {
            accel: 500.0,
            resistance: 0.9,
            max_frustration: 4,
            intelligence: 1.0,
            arrival_desired_speed: 1.0,
            arrival_threshold_sq: 4.0,
        }
    }

    /// Terminal speed where acceleration and resistance balance
    pub fn max_speed(&self) -> f32 {
        if self.resistance >= 1.0 {
            0.0
        } else if self.resistance <= 0.0 {
            f32::INFINITY
        } else {
            self.accel / -(1.0 - self.resistance).ln()
        }
    }

    /// Validates the parameters
    pub fn validate(&self) -> Result<()> {
        if self.accel <= 0.0 {
            return Err(Error::Config("agent acceleration must be positive".to_string()));
        }
        if !(self.resistance > 0.0 && self.resistance < 1.0) {
            return Err(Error::Config(format!(
                "agent resistance {} outside (0, 1)",
                self.resistance
            )));
        }
        if !(0.0..=1.0).contains(&self.intelligence) {
            return Err(Error::Config(format!(
                "agent intelligence {} outside [0, 1]",
                self.intelligence
            )));
        }
        if self.arrival_threshold_sq <= 0.0 {
            return Err(Error::Config("arrival threshold must be positive".to_string()));
        }
        Ok(())
    }
}

/// Crowd driver configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct CrowdConfig {
    /// Collision grid cell size
    pub grid_cell_size: f32,
    /// Collision grid covers `[-half_extent, half_extent]` on both axes
    pub world_half_extent: f32,
    /// Agents beyond this count in one cell are not collided
    pub max_agents_per_cell: usize,
    /// Agent collision radius
    pub agent_radius: f32,
    /// Separation impulse per unit of overlap
    pub push_force: f32,
    /// Collision weight of escaping agents relative to others
    pub escaping_weight: f32,
    /// Seed of the crowd random generator
    pub seed: u64,
    /// Navigation tuning
    pub nav: NavConfig,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            grid_cell_size: 256.0,
            world_half_extent: 10_000.0,
            max_agents_per_cell: 256,
            agent_radius: 2.5,
            push_force: 10.0,
            escaping_weight: 20.0,
            seed: 0x5eed,
            nav: NavConfig::default(),
        }
    }
}

impl CrowdConfig {
    /// Validates the configuration, including the embedded [`NavConfig`]
    pub fn validate(&self) -> Result<()> {
        if self.grid_cell_size <= 0.0 || self.world_half_extent <= 0.0 {
            return Err(Error::Config("collision grid must have a positive size".to_string()));
        }
        if self.max_agents_per_cell == 0 {
            return Err(Error::Config("collision grid cells must hold agents".to_string()));
        }
        if self.agent_radius <= 0.0 {
            return Err(Error::Config("agent radius must be positive".to_string()));
        }
        if self.push_force < 0.0 || self.escaping_weight <= 0.0 {
            return Err(Error::Config("collision weights must be positive".to_string()));
        }
        self.nav.validate()
    }
}
