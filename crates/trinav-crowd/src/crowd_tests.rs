//! End-to-end crowd tests

use glam::Vec2;
use trinav::test_mesh_helpers::{create_l_turn_mesh, create_strip_mesh};
use trinav_common::debug::{DebugDraw, DebugVisualize};
use trinav_common::Error;

use crate::agent::NavState;
use crate::brain::Brain;
use crate::command_buffer::{CommandBuffer, CorridorAction};
use crate::config::{AgentParams, CrowdConfig};
use crate::crowd::Crowd;

const DT: f32 = 1.0 / 60.0;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_agent_walks_the_strip_and_arrives() {
    init_logger();
    let mesh = create_strip_mesh(10).unwrap();
    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let agent = crowd
        .add_agent(Vec2::new(5.0, 7.0), AgentParams::smart_walker(), Brain::Manual)
        .unwrap();
    let target = Vec2::new(95.0, 7.0);
    crowd.set_destination(agent, target).unwrap();

    let mut arrived = false;
    for _ in 0..600 {
        crowd.update(DT).unwrap();
        let state = crowd.agent(agent).unwrap();
        if state.state == NavState::Standing {
            arrived = true;
            break;
        }
    }
    assert!(arrived);

    let state = crowd.agent(agent).unwrap();
    // Arrival is detected before the last physics step moved the agent
    assert!(state.position.distance(target) < 2.0 + state.max_speed * DT + 1e-3);
    assert!(state.corridor.is_empty());
    assert!(state.current_tri.is_some());
}

#[test]
fn test_agent_turns_the_corner() {
    init_logger();
    let mesh = create_l_turn_mesh(true).unwrap();
    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let agent = crowd
        .add_agent(Vec2::new(17.0, 2.0), AgentParams::smart_walker(), Brain::Manual)
        .unwrap();
    let target = Vec2::new(3.0, 16.0);
    crowd.set_destination(agent, target).unwrap();

    let mut closest = f32::INFINITY;
    for _ in 0..600 {
        crowd.update(DT).unwrap();
        let a = crowd.agent(agent).unwrap();
        closest = closest.min(a.position.distance(target));
        if a.state == NavState::Standing {
            break;
        }
    }
    assert!(closest < 4.0);
    assert!(crowd.agent(agent).unwrap().last_valid_tri.is_some());
}

#[test]
fn test_handles_are_generation_checked() {
    let mesh = create_strip_mesh(4).unwrap();
    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let a = crowd.add_agent(Vec2::new(3.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();
    let b = crowd.add_agent(Vec2::new(13.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();
    let c = crowd.add_agent(Vec2::new(23.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();
    assert_eq!(crowd.agent_count(), 3);

    let removed = crowd.remove_agent(a).unwrap();
    assert_eq!(removed.id, 0);
    assert!(crowd.agent(a).is_none());
    assert!(matches!(crowd.remove_agent(a), Err(Error::Agent(_))));

    // Survivors still resolve after the dense array was compacted
    assert_eq!(crowd.agent(b).unwrap().id, 1);
    assert_eq!(crowd.agent(c).unwrap().id, 2);

    let d = crowd.add_agent(Vec2::new(33.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();
    assert_eq!(d.index(), a.index());
    assert_ne!(d, a);
    assert!(crowd.agent(a).is_none());
    assert_eq!(crowd.agent(d).unwrap().id, 3);
    assert_eq!(crowd.agents().count(), 3);
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let mesh = create_strip_mesh(4).unwrap();
    let bad_config = CrowdConfig {
        agent_radius: 0.0,
        ..CrowdConfig::default()
    };
    assert!(matches!(Crowd::new(&mesh, bad_config), Err(Error::Config(_))));

    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let off_mesh = crowd.add_agent(Vec2::new(3.0, 50.0), AgentParams::default(), Brain::Manual);
    assert!(matches!(off_mesh, Err(Error::Agent(_))));

    let bad_params = AgentParams {
        resistance: 1.5,
        ..AgentParams::default()
    };
    assert!(matches!(
        crowd.add_agent(Vec2::new(3.0, 7.0), bad_params, Brain::Manual),
        Err(Error::Config(_))
    ));

    let agent = crowd.add_agent(Vec2::new(3.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();
    assert!(matches!(
        crowd.set_destination(agent, Vec2::new(-20.0, 5.0)),
        Err(Error::Navigation(_))
    ));
    assert!(matches!(crowd.update(f32::NAN), Err(Error::Config(_))));
    assert!(matches!(crowd.update(-1.0), Err(Error::Config(_))));
}

#[test]
fn test_host_commands_set_corridors() {
    let mesh = create_strip_mesh(6).unwrap();
    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let agent = crowd.add_agent(Vec2::new(13.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();
    {
        let a = crowd.agent_mut(agent).unwrap();
        a.end_target = Vec2::new(53.0, 7.0);
        a.end_target_tri = mesh.get_triangle_from_point(a.end_target);
        a.state = NavState::Traveling;
    }

    let mut commands = CommandBuffer::with_capacity(64);
    commands.begin_frame();
    commands.write_command(99, &[1, 2]).unwrap();
    commands
        .write_set_corridor(agent.index(), CorridorAction::SetAndRecalcCorners, &[1, 2, 3, 4, 5])
        .unwrap();
    commands
        .write_set_corridor(57, CorridorAction::SetOnly, &[0])
        .unwrap();
    commands
        .write_set_corridor(agent.index(), CorridorAction::SetOnly, &[1, 2, 700])
        .unwrap();
    commands.commit_frame();

    assert_eq!(crowd.apply_commands(commands.reader()), 1);
    let a = crowd.agent(agent).unwrap();
    // The corridor with a bogus polygon was rejected
    assert_eq!(a.corridor, vec![1, 2, 3, 4, 5]);
    assert_eq!(a.num_valid_corners, 1);
    assert!(a.next_corner.distance(Vec2::new(53.0, 7.0)) < 1e-4);
    assert_eq!(a.last_visible_point, a.position);
}

#[test]
fn test_straight_corner_command() {
    let mesh = create_strip_mesh(6).unwrap();
    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let agent = crowd.add_agent(Vec2::new(13.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();
    {
        let a = crowd.agent_mut(agent).unwrap();
        a.end_target = Vec2::new(33.0, 7.0);
        a.end_target_tri = mesh.get_triangle_from_point(a.end_target);
        a.path_frustration = 3;
    }

    let mut commands = CommandBuffer::with_capacity(16);
    commands.begin_frame();
    commands
        .write_set_corridor(agent.index(), CorridorAction::SetAndStraightCorner, &[1, 2, 3])
        .unwrap();
    commands.commit_frame();
    crowd.apply_commands(commands.reader());

    let a = crowd.agent(agent).unwrap();
    assert_eq!(a.next_corner, Vec2::new(33.0, 7.0));
    assert_eq!(a.next_corner_tri, a.end_target_tri);
    assert_eq!(a.num_valid_corners, 1);
    assert_eq!(a.path_frustration, 0);
}

#[test]
fn test_wanderers_keep_moving() {
    let mesh = create_strip_mesh(8).unwrap();
    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let spawns = [Vec2::new(13.0, 7.0), Vec2::new(43.0, 7.0), Vec2::new(63.0, 7.0)];
    let brains = [Brain::WanderFloat, Brain::WanderDir { end_at: 0.0 }, Brain::RandomJourney];
    let handles: Vec<_> = spawns
        .iter()
        .zip(brains)
        .map(|(&p, brain)| crowd.add_agent(p, AgentParams::smart_walker(), brain).unwrap())
        .collect();

    for _ in 0..120 {
        crowd.update(DT).unwrap();
    }
    assert_eq!(crowd.stats().frame, 120);
    assert_eq!(crowd.stats().agents, 3);
    assert!((crowd.game_time() - 2.0).abs() < 1e-3);
    for (handle, spawn) in handles.iter().zip(spawns) {
        let agent = crowd.agent(*handle).unwrap();
        assert_ne!(agent.position, spawn);
    }
}

#[test]
fn test_overlapping_agents_separate() {
    let mesh = create_strip_mesh(4).unwrap();
    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let a = crowd.add_agent(Vec2::new(13.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();
    let b = crowd.add_agent(Vec2::new(14.0, 7.0), AgentParams::default(), Brain::Manual).unwrap();

    for _ in 0..10 {
        crowd.update(DT).unwrap();
    }
    let pa = crowd.agent(a).unwrap().position;
    let pb = crowd.agent(b).unwrap().position;
    assert!(pa.distance(pb) > 1.5);
    assert!(pa.x < 13.0);
    assert!(pb.x > 14.0);
}

#[test]
fn test_debug_draw_and_path_preview() {
    let mesh = create_l_turn_mesh(true).unwrap();
    let mut crowd = Crowd::new(&mesh, CrowdConfig::default()).unwrap();
    let agent = crowd
        .add_agent(Vec2::new(17.0, 8.0), AgentParams::default(), Brain::Manual)
        .unwrap();
    assert!(matches!(crowd.path_preview(agent), Err(Error::Pathfinding(_))));

    // The straight line crosses the blob, so the route bends at its corner
    let target = Vec2::new(2.0, 17.0);
    crowd.set_destination(agent, target).unwrap();
    crowd.set_debug_agent(Some(agent));
    crowd.update(DT).unwrap();

    let preview = crowd.path_preview(agent).unwrap();
    assert_eq!(preview.len(), 3);
    assert!(preview[1].point.distance(Vec2::splat(10.0)) < 2.2 + 1e-3);
    assert!(preview[2].point.distance(target) < 1e-4);

    let mut draw = DebugDraw::new();
    crowd.debug_draw(&mut draw);
    assert!(!draw.points.is_empty());
    assert_eq!(draw.areas.len(), crowd.agent(agent).unwrap().corridor.len());
    assert!(!draw.lines.is_empty());
    assert_eq!(draw.text.len(), 1);

    crowd.remove_agent(agent).unwrap();
    let mut draw = DebugDraw::new();
    crowd.debug_draw(&mut draw);
    assert!(draw.is_empty());
}
