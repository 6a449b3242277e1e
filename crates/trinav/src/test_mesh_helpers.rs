//! Small hand-built navigation meshes
//!
//! Used by the unit tests of this crate and of the crowd crate, and handy for
//! hosts that want a known mesh to smoke-test against.

use glam::Vec2;
use trinav_common::Result;

use crate::nav_mesh::{NavMesh, PolyId};
use crate::nav_mesh_builder::NavMeshBuilder;
use crate::spatial_index::SpatialIndexConfig;

/// Blob polygon id of [`create_l_blob_mesh`]
pub const L_BLOB: PolyId = 3;

/// Unit square split along the 1-3 diagonal into two triangles, each its own
/// polygon.
///
/// ```text
/// 3 ---- 2
/// | \  1 |
/// | 0  \ |
/// 0 ---- 1
/// ```
pub fn create_unit_square_mesh() -> Result<NavMesh> {
    let mut builder = NavMeshBuilder::new(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ]);
    builder.add_polygon(&[[0, 1, 3]]);
    builder.add_polygon(&[[1, 2, 3]]);
    builder.build(SpatialIndexConfig::default())
}

/// 20x20 square of four 10x10 cells; the top-right cell is a blob so the
/// walkable area is an L around it.
///
/// ```text
/// 6 ---- 7 ---- 8
/// |  2   | blob |
/// 3 ---- 4 ---- 5
/// |  0   |  1   |
/// 0 ---- 1 ---- 2
/// ```
pub fn create_l_blob_mesh() -> Result<NavMesh> {
    let mut vertices = Vec::with_capacity(9);
    for y in 0..3 {
        for x in 0..3 {
            vertices.push(Vec2::new(x as f32 * 10.0, y as f32 * 10.0));
        }
    }
    let mut builder = NavMeshBuilder::new(vertices);
    builder.add_polygon(&[[0, 1, 4], [0, 4, 3]]);
    builder.add_polygon(&[[1, 2, 5], [1, 5, 4]]);
    builder.add_polygon(&[[3, 4, 7], [3, 7, 6]]);
    builder.add_blob(&[[4, 5, 8], [4, 8, 7]], &[vec![4, 5, 8, 7]]);
    builder.build(SpatialIndexConfig::default())
}

/// Same outline as [`create_l_blob_mesh`], with the cells split along the
/// other diagonal so points on the `y = x` line through vertex 4 are inside
/// triangles. Without `with_blob` the top-right cell is empty space.
pub fn create_l_turn_mesh(with_blob: bool) -> Result<NavMesh> {
    let mut vertices = Vec::with_capacity(9);
    for y in 0..3 {
        for x in 0..3 {
            vertices.push(Vec2::new(x as f32 * 10.0, y as f32 * 10.0));
        }
    }
    let mut builder = NavMeshBuilder::new(vertices);
    builder.add_polygon(&[[0, 1, 3], [1, 4, 3]]);
    builder.add_polygon(&[[1, 2, 4], [2, 5, 4]]);
    builder.add_polygon(&[[3, 4, 6], [4, 7, 6]]);
    if with_blob {
        builder.add_blob(&[[4, 5, 8], [4, 8, 7]], &[vec![4, 5, 8, 7]]);
    }
    builder.build(SpatialIndexConfig::default())
}

/// Two 10x10 squares 100 units apart with no connection between them
pub fn create_islands_mesh() -> Result<NavMesh> {
    let mut builder = NavMeshBuilder::new(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(10.0, 10.0),
        Vec2::new(0.0, 10.0),
        Vec2::new(100.0, 0.0),
        Vec2::new(110.0, 0.0),
        Vec2::new(110.0, 10.0),
        Vec2::new(100.0, 10.0),
    ]);
    builder.add_polygon(&[[0, 1, 2], [0, 2, 3]]);
    builder.add_polygon(&[[4, 5, 6], [4, 6, 7]]);
    builder.build(SpatialIndexConfig::default())
}

/// Straight strip of `cells` 10x10 square polygons along +x
pub fn create_strip_mesh(cells: u32) -> Result<NavMesh> {
    let top = cells + 1;
    let mut vertices = Vec::with_capacity(2 * top as usize);
    for y in [0.0, 10.0] {
        for i in 0..=cells {
            vertices.push(Vec2::new(i as f32 * 10.0, y));
        }
    }
    let mut builder = NavMeshBuilder::new(vertices);
    for i in 0..cells {
        builder.add_polygon(&[[i, i + 1, top + i + 1], [i, top + i + 1, top + i]]);
    }
    builder.build(SpatialIndexConfig::default())
}
