//! Common utilities and data structures shared by the navmesh and crowd crates

pub mod debug;
mod geometry;
mod math;

pub use geometry::*;
pub use math::*;

/// Represents a 2D position on the navigation plane
pub type Vec2 = glam::Vec2;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input mesh: {0}")]
    InvalidMesh(String),

    #[error("pathfinding failed: {0}")]
    Pathfinding(String),

    #[error("no corner found: {0}")]
    CornerNotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("command buffer error: {0}")]
    CommandBuffer(String),

    #[error("navigation error: {0}")]
    Navigation(String),
}

/// Result type for trinav operations
pub type Result<T> = std::result::Result<T, Error>;
