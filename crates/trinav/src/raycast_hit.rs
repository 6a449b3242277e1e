//! Raycast hit information

use glam::Vec2;

use crate::nav_mesh::{TriId, VertId};

/// Wall hit reported by a mesh raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// First endpoint of the blocking edge
    pub edge_start: Vec2,
    /// Second endpoint of the blocking edge
    pub edge_end: Vec2,
    /// Vertex ids of the blocking edge (`None` when the ray started off-mesh)
    pub edge_verts: Option<[VertId; 2]>,
    /// Triangle the walk was in when it hit the edge
    pub triangle: Option<TriId>,
    /// Blob triangle across the edge, `None` on a mesh boundary
    pub blocking_tri: Option<TriId>,
}

impl RaycastHit {
    /// Hit reported when the start point is not on the walkable mesh
    pub fn off_mesh(start: Vec2) -> Self {
        Self {
            edge_start: start,
            edge_end: start,
            edge_verts: None,
            triangle: None,
            blocking_tri: None,
        }
    }

    /// Checks whether the walk never left the start point
    pub fn is_off_mesh(&self) -> bool {
        self.triangle.is_none()
    }

    /// Direction of the blocking edge (zero for off-mesh hits)
    pub fn edge_dir(&self) -> Vec2 {
        self.edge_end - self.edge_start
    }
}

/// Result of a mesh raycast
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RaycastResult {
    /// Wall hit, `None` when the line of sight is clear
    pub hit: Option<RaycastHit>,
    /// Last triangle reached by the walk
    pub last_tri: Option<TriId>,
    /// The walk stopped before deciding, at its step cap or on a broken
    /// neighbor link
    pub partial: bool,
}

impl RaycastResult {
    /// Checks whether the walk reached the end without a hit
    pub fn is_clear(&self) -> bool {
        self.hit.is_none() && !self.partial
    }
}
