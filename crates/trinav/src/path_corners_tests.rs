//! Funnel and corner offset tests

use glam::Vec2;
use trinav_common::points_equal;

use crate::test_mesh_helpers::*;
use crate::{CorridorSearchParams, NavMeshQuery, Portal, Status};

const CORNER_OFFSET: f32 = 2.2;

fn assert_near(a: Vec2, b: Vec2) {
    assert!(a.distance(b) < 1e-4, "{a:?} != {b:?}");
}

#[test]
fn test_single_polygon_corner_is_destination() {
    let mesh = create_strip_mesh(3).unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let end = Vec2::new(18.0, 3.0);
    let corners = query
        .find_next_corner(Vec2::new(12.0, 7.0), &[1], end, CORNER_OFFSET)
        .unwrap();
    assert_eq!(corners.num_valid, 1);
    assert_eq!(corners.corner1, end);
    let tri = corners.tri1.unwrap();
    assert!(mesh.point_in_triangle(end, tri));
    assert_eq!(mesh.triangle_to_polygon(tri), Some(1));
}

#[test]
fn test_empty_corridor_corner_is_destination() {
    let mesh = create_strip_mesh(1).unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let end = Vec2::new(5.0, 5.0);
    let corners = query.find_next_corner(Vec2::ZERO, &[], end, 0.0).unwrap();
    assert_eq!(corners.num_valid, 1);
    assert_eq!(corners.corner1, end);
    assert_eq!(corners.tri1, None);
}

#[test]
fn test_straight_corridor_has_no_turn() {
    let mesh = create_strip_mesh(4).unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let end = Vec2::new(35.0, 5.0);
    let corners = query
        .find_next_corner(Vec2::new(5.0, 5.0), &[0, 1, 2, 3], end, CORNER_OFFSET)
        .unwrap();
    assert_eq!(corners.num_valid, 1);
    assert_eq!(corners.corner1, end);
}

#[test]
fn test_square_portal_orientation() {
    let mesh = create_unit_square_mesh().unwrap();
    let portal = mesh.polygon_portal(0, 1).unwrap();
    // Shared edge is the 1-3 diagonal; travelling from poly 0 towards
    // poly 1 vertex 3 is on the left
    assert_eq!(portal.left_vertex, Some(3));
    assert_eq!(portal.right_vertex, Some(1));

    let mut portals = Vec::new();
    mesh.build_portals(&[0, 1], Vec2::new(0.1, 0.1), Vec2::new(0.9, 0.9), &mut portals)
        .unwrap();
    assert_eq!(portals.len(), 3);
    assert_eq!(portals[0], Portal::point(Vec2::new(0.1, 0.1)));
    assert_eq!(portals[1], portal);
}

#[test]
fn test_l_turn_has_one_corner_on_shared_vertex() {
    let mesh = create_l_blob_mesh().unwrap();
    let start = Vec2::new(18.0, 8.0);
    let end = Vec2::new(7.0, 18.0);

    let corners = mesh.find_corners(&[1, 0, 2], start, end).unwrap();
    assert_eq!(corners.len(), 3);
    assert_eq!(corners[0].point, start);
    assert_eq!(corners[1].point, Vec2::new(10.0, 10.0));
    assert_eq!(corners[2].point, end);
    assert_eq!(corners[2].poly, Some(2));

    let mut query = NavMeshQuery::new(&mesh);
    let dual = query.find_next_corner(start, &[1, 0, 2], end, 0.0).unwrap();
    assert_eq!(dual.num_valid, 2);
    assert_eq!(dual.corner1, Vec2::new(10.0, 10.0));
    assert_eq!(dual.vertex1, Some(4));
    assert_eq!(dual.corner2, end);
    assert_eq!(dual.vertex2, None);
    assert!(mesh.point_in_triangle(dual.corner1, dual.tri1.unwrap()));
}

#[test]
fn test_offset_corner_distance_equals_offset() {
    let mesh = create_l_blob_mesh().unwrap();
    let vertex = mesh.vertex(4);
    let start = Vec2::new(18.0, 8.0);
    let end = Vec2::new(7.0, 18.0);

    let mut query = NavMeshQuery::new(&mesh);
    let dual = query
        .find_next_corner(start, &[1, 0, 2], end, CORNER_OFFSET)
        .unwrap();
    assert_eq!(dual.num_valid, 2);
    assert!((dual.corner1.distance(vertex) - CORNER_OFFSET).abs() < 1e-4);
    // Pushed away from the blob in the top-right, into the walkable L
    assert!(dual.corner1.x < vertex.x && dual.corner1.y < vertex.y);
    let tri = dual.tri1.unwrap();
    assert!(mesh.is_walkable_triangle(tri));
    assert!(mesh.point_in_triangle(dual.corner1, tri));
    // The destination is never offset
    assert_eq!(dual.corner2, end);
}

#[test]
fn test_miter_offset_bisects_blob_corner() {
    let mesh = create_l_blob_mesh().unwrap();
    let vertex = mesh.vertex(4);
    let moved = mesh
        .compute_corner_miter_offset(L_BLOB, 4, vertex, 1.0)
        .unwrap();
    let expected = vertex - Vec2::splat(std::f32::consts::FRAC_1_SQRT_2);
    assert_near(moved, expected);
    assert_eq!(mesh.blob_with_vertex(4, vertex), Some(L_BLOB));
    assert_eq!(mesh.compute_corner_miter_offset(L_BLOB, 0, vertex, 1.0), None);
}

#[test]
fn test_outer_boundary_corner_is_not_offset() {
    let mesh = create_l_turn_mesh(false).unwrap();
    let vertex = mesh.vertex(4);
    assert_eq!(mesh.blob_with_vertex(4, vertex), None);

    let end = Vec2::new(3.0, 16.0);
    let (point, tri) = mesh.apply_corner_offset(vertex, Some(4), Some(1), end, CORNER_OFFSET);
    assert_eq!(point, vertex);
    assert_eq!(tri, Some(1));
}

#[test]
fn test_disconnected_corridor_reports_corner_not_found() {
    let mesh = create_strip_mesh(4).unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let result = query.find_next_corner(Vec2::new(5.0, 5.0), &[0, 2], Vec2::new(25.0, 5.0), 0.0);
    assert_eq!(result, Err(Status::CornerNotFound));
}

#[test]
fn test_corners_follow_searched_corridor() {
    let mesh = create_l_blob_mesh().unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let start = Vec2::new(18.0, 8.0);
    let end = Vec2::new(7.0, 18.0);
    let corridor = query
        .find_corridor(start, end, None, None, &CorridorSearchParams::default())
        .unwrap();
    let corners = mesh.find_corners(&corridor, start, end).unwrap();
    assert!(corners.iter().any(|c| points_equal(c.point, Vec2::new(10.0, 10.0))));
}
