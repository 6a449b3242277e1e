//! Triangle navigation mesh queries
//!
//! This crate holds the read-only navigation mesh and the queries agents run
//! against it every frame: point location, corridor search, corner
//! extraction and line-of-sight raycasts.
//!
//! # Features
//!
//! - **Navmesh store**: flat vertex/triangle/polygon arrays with derived
//!   centroids, lookup maps and uniform-grid spatial indices
//! - **Corridor search**: weighted A* over the walkable polygon graph with a
//!   bias towards straight routes
//! - **Funnel**: taut-string corner extraction, full or two-corner lookahead,
//!   with miter offsets around obstacle corners
//! - **Raycasting**: triangle-walk line tracing for line of sight and wall
//!   collision
//!
//! # Example
//!
//! ```rust,ignore
//! use trinav::{NavMeshBuilder, NavMeshQuery, CorridorSearchParams, SpatialIndexConfig};
//!
//! let mesh = builder.build(SpatialIndexConfig::default())?;
//! let mut query = NavMeshQuery::new(&mesh);
//!
//! let corridor = query.find_corridor(start, end, None, None, &CorridorSearchParams::default())?;
//! let corners = query.find_next_corner(start, &corridor, end, 2.2)?;
//! let sight = mesh.raycast_point(start, corners.corner1, None, corners.tri1);
//! ```
//!
//! # Conventions
//!
//! Corridors are stored current polygon first. Ids are `u32`; raw neighbor
//! arrays use `-1` for "no neighbor" while the accessors return `Option`.

pub mod nav_mesh;
pub mod nav_mesh_builder;
pub mod nav_mesh_query;
pub mod nav_utils;
pub mod path_corners;
pub mod priority_queue;
pub mod raycast;
pub mod raycast_hit;
pub mod spatial_index;
pub mod status;
pub mod test_mesh_helpers;

pub use nav_mesh::*;
pub use nav_mesh_builder::*;
pub use nav_mesh_query::*;
pub use nav_utils::*;
pub use path_corners::*;
pub use priority_queue::*;
pub use raycast::*;
pub use raycast_hit::*;
pub use spatial_index::*;
pub use status::Status;

#[cfg(test)]
mod corridor_search_tests;
#[cfg(test)]
mod path_corners_tests;
#[cfg(test)]
mod raycast_tests;
