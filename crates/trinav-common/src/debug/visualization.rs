//! Navigation-specific visualization traits and palettes
//!
//! Implemented by the navmesh and crowd crates without creating circular
//! dependencies.

use super::{Color, DebugSink};

/// Trait for types that can draw themselves into a debug sink
pub trait DebugVisualize {
    /// Draws debug visualization for this type
    fn debug_draw(&self, sink: &mut dyn DebugSink);
}

/// Colors used for navmesh regions
#[derive(Debug, Clone, Copy)]
pub struct NavMeshColors;

impl NavMeshColors {
    /// Walkable polygon outline
    pub const WALKABLE: Color = Color::from_hex(0x4caf50);

    /// Blob (impassable) polygon outline
    pub const BLOB: Color = Color::from_hex(0x8d6e63);

    /// Corridor polygons of a selected agent
    pub const CORRIDOR: Color = Color::from_hex(0x2196f3);
}

/// Colors used for agent navigation state
#[derive(Debug, Clone, Copy)]
pub struct NavStateColors;

impl NavStateColors {
    /// Idle agent
    pub const STANDING: Color = Color::GRAY;

    /// Agent following a corridor
    pub const TRAVELING: Color = Color::GREEN;

    /// Agent walking back onto the mesh
    pub const ESCAPING: Color = Color::RED;

    /// First lookahead corner
    pub const CORNER: Color = Color::YELLOW;

    /// Second lookahead corner
    pub const CORNER2: Color = Color::ORANGE;

    /// Raycast hit / wall contact
    pub const HIT: Color = Color::MAGENTA;
}
