//! Raycast tests

use glam::Vec2;

use crate::test_mesh_helpers::*;
use crate::{NavMeshQuery, NavMeshData, NavMesh, SpatialIndexConfig};

#[test]
fn test_square_diagonal_is_clear() {
    let mesh = create_unit_square_mesh().unwrap();
    let mut corridor = Vec::new();
    let result = mesh.raycast_corridor(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), None, None, &mut corridor);
    assert!(result.is_clear());
    assert!(!result.partial);
    assert_eq!(corridor, vec![0, 1]);
    assert_eq!(result.last_tri, Some(1));
}

#[test]
fn test_end_hint_stops_walk() {
    let mesh = create_strip_mesh(4).unwrap();
    let mut corridor = Vec::new();
    let start = Vec2::new(3.0, 6.0);
    let end = Vec2::new(37.0, 4.0);
    let end_tri = mesh.get_triangle_from_point(end).unwrap();
    let result = mesh.raycast_corridor(start, end, None, Some(end_tri), &mut corridor);
    assert!(result.is_clear());
    assert_eq!(corridor.first(), mesh.get_triangle_from_point(start).as_ref());
    assert_eq!(corridor.last(), Some(&end_tri));
    for pair in corridor.windows(2) {
        assert!(mesh.triangle_neighbors(pair[0]).contains(&(pair[1] as i32)));
    }
}

#[test]
fn test_boundary_hit_reports_edge() {
    let mesh = create_strip_mesh(2).unwrap();
    let result = mesh.raycast_point(Vec2::new(3.0, 6.0), Vec2::new(3.0, 30.0), None, None);
    let hit = result.hit.unwrap();
    assert_eq!(hit.edge_start, Vec2::new(10.0, 10.0));
    assert_eq!(hit.edge_end, Vec2::new(0.0, 10.0));
    assert_eq!(hit.edge_verts, Some([4, 3]));
    assert_eq!(hit.blocking_tri, None);
    assert_eq!(hit.triangle, result.last_tri);
}

#[test]
fn test_blob_hit_reports_blocking_triangle() {
    let mesh = create_l_blob_mesh().unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let result = query.raycast_corridor(Vec2::new(14.0, 6.0), Vec2::new(14.0, 16.0), None, None);
    let hit = result.hit.unwrap();
    assert_eq!(hit.edge_verts, Some([5, 4]));
    let blocking = hit.blocking_tri.unwrap();
    assert!(!mesh.is_walkable_triangle(blocking));
    assert_eq!(mesh.triangle_to_polygon(blocking), Some(L_BLOB));
    assert_eq!(query.raycast_triangles(), &[3]);
}

#[test]
fn test_walk_around_l_is_blocked_but_legs_are_clear() {
    let mesh = create_l_blob_mesh().unwrap();
    let start = Vec2::new(18.0, 8.0);
    let end = Vec2::new(7.0, 18.0);
    assert!(!mesh.raycast_point(start, end, None, None).is_clear());
    assert!(mesh.raycast_point(start, Vec2::new(9.0, 9.0), None, None).is_clear());
    assert!(mesh.raycast_point(Vec2::new(9.0, 9.0), end, None, None).is_clear());
}

#[test]
fn test_off_mesh_start_is_a_hit_at_start() {
    let mesh = create_unit_square_mesh().unwrap();
    let start = Vec2::new(-1.0, -1.0);
    let mut corridor = vec![7];
    let result = mesh.raycast_corridor(start, Vec2::new(0.5, 0.5), None, None, &mut corridor);
    let hit = result.hit.unwrap();
    assert!(hit.is_off_mesh());
    assert_eq!(hit.edge_start, start);
    assert_eq!(hit.edge_end, start);
    assert!(corridor.is_empty());
}

#[test]
fn test_clockwise_triangles_trace_the_same() {
    // Same square as the helper, with both triangles stored clockwise
    let data = NavMeshData {
        vertices: vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ],
        triangles: vec![[0, 3, 1], [1, 3, 2]],
        neighbors: vec![[-1, 1, -1], [0, -1, -1]],
        polygons: vec![0, 3, 6],
        poly_verts: vec![0, 3, 1, 1, 3, 2],
        poly_tris: vec![0, 1, 2],
        poly_neighbors: vec![-1, 1, -1, 0, -1, -1],
        walkable_triangle_count: 2,
        walkable_polygon_count: 2,
        ..Default::default()
    };
    let mesh = NavMesh::new(data, SpatialIndexConfig::default()).unwrap();
    let mut corridor = Vec::new();
    let result = mesh.raycast_corridor(Vec2::new(0.1, 0.1), Vec2::new(0.9, 0.9), None, None, &mut corridor);
    assert!(result.is_clear());
    assert_eq!(corridor, vec![0, 1]);
}

#[test]
fn test_step_cap_is_partial_not_clear() {
    let mesh = create_strip_mesh(3000).unwrap();
    let mut corridor = Vec::new();
    let result = mesh.raycast_corridor(
        Vec2::new(3.0, 7.0),
        Vec2::new(29_995.0, 3.0),
        None,
        None,
        &mut corridor,
    );
    assert!(result.hit.is_none());
    assert!(result.partial);
    assert!(!result.is_clear());
    assert_eq!(corridor.len(), crate::MAX_RAYCAST_STEPS + 1);
}
