//! Corridor search tests

use glam::Vec2;

use crate::test_mesh_helpers::*;
use crate::{CorridorSearchParams, NavMeshQuery, Status};

#[test]
fn test_same_polygon_needs_no_expansion() {
    let mesh = create_strip_mesh(3).unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let params = CorridorSearchParams::default();

    for poly in 0..mesh.polygon_count() {
        let c = mesh.poly_centroid(poly);
        let corridor = query
            .find_corridor(c, c + Vec2::new(1.0, 1.0), Some(poly), Some(poly), &params)
            .unwrap();
        assert_eq!(corridor, vec![poly]);
        assert_eq!(query.last_expansions(), 0);
    }
}

#[test]
fn test_straight_strip_corridor_is_current_first() {
    let mesh = create_strip_mesh(5).unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let corridor = query
        .find_corridor(
            Vec2::new(3.0, 6.0),
            Vec2::new(47.0, 4.0),
            None,
            None,
            &CorridorSearchParams::default(),
        )
        .unwrap();
    assert_eq!(corridor, vec![0, 1, 2, 3, 4]);

    let back = query
        .find_corridor(
            Vec2::new(47.0, 4.0),
            Vec2::new(3.0, 6.0),
            None,
            None,
            &CorridorSearchParams::default(),
        )
        .unwrap();
    assert_eq!(back, vec![4, 3, 2, 1, 0]);
}

#[test]
fn test_corridor_goes_around_blob() {
    let mesh = create_l_blob_mesh().unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let corridor = query
        .find_corridor(
            Vec2::new(18.0, 8.0),
            Vec2::new(7.0, 18.0),
            None,
            None,
            &CorridorSearchParams::default(),
        )
        .unwrap();
    assert_eq!(corridor, vec![1, 0, 2]);
    assert!(!corridor.contains(&L_BLOB));
}

#[test]
fn test_adjacent_corridor_entries_share_an_edge() {
    let mesh = create_strip_mesh(8).unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let params = CorridorSearchParams {
        free_width: 1.0,
        stray_multiplier: 10.0,
    };
    let corridor = query
        .find_corridor(Vec2::new(75.0, 5.0), Vec2::new(5.0, 5.0), None, None, &params)
        .unwrap();
    assert_eq!(corridor.first(), Some(&7));
    assert_eq!(corridor.last(), Some(&0));
    for pair in corridor.windows(2) {
        assert!(mesh.shared_edge(pair[0], pair[1]).is_some());
    }
}

#[test]
fn test_disconnected_islands_not_found() {
    let mesh = create_islands_mesh().unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let result = query.find_corridor(
        Vec2::new(5.0, 5.0),
        Vec2::new(105.0, 5.0),
        None,
        None,
        &CorridorSearchParams::default(),
    );
    assert_eq!(result, Err(Status::PathNotFound));
    assert!(query.last_expansions() <= crate::MAX_CORRIDOR_EXPANSIONS);
}

#[test]
fn test_off_mesh_and_blob_endpoints_fail() {
    let mesh = create_l_blob_mesh().unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let params = CorridorSearchParams::default();

    let off_mesh = query.find_corridor(Vec2::new(-50.0, 5.0), Vec2::new(5.0, 5.0), None, None, &params);
    assert_eq!(off_mesh, Err(Status::PathNotFound));

    let into_blob = query.find_corridor(Vec2::new(5.0, 5.0), Vec2::new(15.0, 15.0), None, None, &params);
    assert_eq!(into_blob, Err(Status::PathNotFound));

    let bad_id = query.find_corridor(Vec2::ZERO, Vec2::ZERO, Some(99), Some(0), &params);
    assert_eq!(bad_id, Err(Status::PathNotFound));
}

#[test]
fn test_failed_search_keeps_previous_corridor() {
    let mesh = create_islands_mesh().unwrap();
    let mut query = NavMeshQuery::new(&mesh);
    let mut corridor = vec![0];
    let result = query.find_corridor_into(
        Vec2::new(5.0, 5.0),
        Vec2::new(105.0, 5.0),
        Some(0),
        Some(1),
        &CorridorSearchParams::default(),
        &mut corridor,
    );
    assert!(result.is_err());
    assert_eq!(corridor, vec![0]);
}
