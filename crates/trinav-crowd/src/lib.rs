//! Crowd navigation on triangle navmeshes
//!
//! This crate moves many agents over a shared [`trinav::NavMesh`]. Each
//! agent follows a polygon corridor through two lookahead corners, repairs
//! the corridor locally with raycasts when it gets pushed off course, and
//! escalates to full repaths and new destinations when it stays stuck.
//!
//! # Features
//!
//! - **Navigation state machine**: standing, traveling and escaping agents
//!   with stuck, sight, frustration and predicament ratings
//! - **Path patching**: raycast shortcuts and local corridor repairs around
//!   obstacle corners
//! - **Steering physics**: acceleration with resistance, corner braking,
//!   wall sliding
//! - **Collision**: Halton-jittered uniform grid with weighted pairwise
//!   separation
//! - **Brains**: random journeys and two wandering behaviors
//! - **Command buffer**: word-packed corridor commands for batching across
//!   an FFI or wasm boundary
//!
//! # Example
//!
//! ```rust,ignore
//! use trinav_crowd::{AgentParams, Brain, Crowd, CrowdConfig};
//!
//! let mut crowd = Crowd::new(&nav_mesh, CrowdConfig::default())?;
//! let agent = crowd.add_agent(spawn, AgentParams::smart_walker(), Brain::Manual)?;
//! crowd.set_destination(agent, target)?;
//!
//! for _ in 0..600 {
//!     crowd.update(1.0 / 60.0)?;
//! }
//! ```
//!
//! # Architecture
//!
//! - [`Crowd`]: owns the agents and runs the per-frame passes
//! - [`agent_navigation`]: per-agent state machine
//! - [`PathPatcher`]: raycast-and-patch corridor repair
//! - [`agent_physics`] and [`agent_statistic`]: movement and stuck tracking
//! - [`AgentGrid`] and [`agent_collision`]: agent-agent separation
//! - [`Brain`]: destination choice
//! - [`CommandBuffer`]: corridor commands

pub mod agent;
pub mod agent_collision;
pub mod agent_grid;
pub mod agent_navigation;
pub mod agent_physics;
pub mod agent_statistic;
pub mod brain;
pub mod command_buffer;
pub mod config;
pub mod crowd;
pub mod frame_stats;
pub mod path_patching;

pub use agent::*;
pub use agent_collision::*;
pub use agent_grid::*;
pub use agent_navigation::*;
pub use agent_physics::*;
pub use agent_statistic::*;
pub use brain::*;
pub use command_buffer::*;
pub use config::*;
pub use crowd::*;
pub use frame_stats::*;
pub use path_patching::*;

#[cfg(test)]
mod crowd_tests;
