//! Crowd driver
//!
//! The crowd owns the agents and the per-frame scratch state and runs one
//! simulation step in fixed passes:
//!
//! 1. brains pick destinations and queue corridor commands
//! 2. queued commands are applied
//! 3. navigation state machine
//! 4. stuck statistics and movement
//! 5. collision grid rebuild and agent-agent separation
//!
//! Agents live in a dense array for cache-friendly passes and are addressed
//! from outside through generation-checked [`AgentHandle`]s.

use glam::Vec2;
use trinav::{Corner, NavMesh, NavMeshQuery};
use trinav_common::debug::{Color, DebugSink, DebugVisualize, NavMeshColors, NavStateColors};
use trinav_common::{Error, Result};

use crate::agent::{Agent, NavState};
use crate::agent_collision::update_agent_collisions;
use crate::agent_grid::AgentGrid;
use crate::agent_navigation::{update_agent_navigation, NavContext};
use crate::agent_physics::update_agent_physics;
use crate::agent_statistic::update_agent_statistic;
use crate::brain::{update_brain, Brain, BrainContext, BrainScratch};
use crate::command_buffer::{
    CommandBuffer, CommandReader, CorridorAction, SetCorridor, CMD_SET_CORRIDOR, DEFAULT_COMMAND_WORDS,
};
use crate::config::{AgentParams, CrowdConfig};
use crate::frame_stats::{FramePass, FrameStats};
use crate::path_patching::PathPatcher;

/// Stable reference to an agent of a [`Crowd`]
///
/// Handles of removed agents stay invalid even when their slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentHandle {
    index: u32,
    generation: u32,
}

impl AgentHandle {
    /// Slot index, the agent address used in corridor commands
    pub fn index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    /// Position in the dense agent array, `None` when free
    dense: Option<usize>,
}

/// A crowd of agents navigating one mesh
pub struct Crowd<'a> {
    nav_mesh: &'a NavMesh,
    query: NavMeshQuery<'a>,
    config: CrowdConfig,
    agents: Vec<Agent>,
    /// Handle of each dense agent
    handles: Vec<AgentHandle>,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    next_agent_id: u32,
    rng: fastrand::Rng,
    grid: AgentGrid,
    patcher: PathPatcher,
    commands: CommandBuffer,
    brain_scratch: BrainScratch,
    stats: FrameStats,
    game_time: f32,
    debug_agent: Option<AgentHandle>,
}

impl<'a> Crowd<'a> {
    /// Creates an empty crowd on `nav_mesh`
    pub fn new(nav_mesh: &'a NavMesh, config: CrowdConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nav_mesh,
            query: NavMeshQuery::new(nav_mesh),
            rng: fastrand::Rng::with_seed(config.seed),
            grid: AgentGrid::new(&config),
            config,
            agents: Vec::new(),
            handles: Vec::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            next_agent_id: 0,
            patcher: PathPatcher::new(),
            commands: CommandBuffer::with_capacity(DEFAULT_COMMAND_WORDS),
            brain_scratch: BrainScratch::default(),
            stats: FrameStats::new(),
            game_time: 0.0,
            debug_agent: None,
        })
    }

    pub fn nav_mesh(&self) -> &'a NavMesh {
        self.nav_mesh
    }

    pub fn config(&self) -> &CrowdConfig {
        &self.config
    }

    /// Simulated seconds since creation
    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    /// Timings and counters of the last update
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Collision grid of the last update
    pub fn grid(&self) -> &AgentGrid {
        &self.grid
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Spawns a standing agent at `position`, which must be on the walkable mesh
    pub fn add_agent(&mut self, position: Vec2, params: AgentParams, brain: Brain) -> Result<AgentHandle> {
        params.validate()?;
        let tri = self.nav_mesh.get_triangle_from_point(position).ok_or_else(|| {
            Error::Agent(format!(
                "spawn point ({:.2}, {:.2}) is not on the walkable mesh",
                position.x, position.y
            ))
        })?;

        let mut agent = Agent::new(self.next_agent_id, position, params, brain);
        self.next_agent_id = self.next_agent_id.wrapping_add(1);
        agent.current_tri = Some(tri);
        agent.last_valid_tri = Some(tri);

        let dense = self.agents.len();
        let handle = match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.dense = Some(dense);
                AgentHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| Error::Agent("crowd is full".to_string()))?;
                self.slots.push(Slot {
                    generation: 0,
                    dense: Some(dense),
                });
                AgentHandle { index, generation: 0 }
            }
        };

        log::debug!(
            "agent {} spawned at ({:.2}, {:.2}) in slot {}",
            agent.id,
            position.x,
            position.y,
            handle.index
        );
        self.agents.push(agent);
        self.handles.push(handle);
        Ok(handle)
    }

    fn dense_index(&self, handle: AgentHandle) -> Option<usize> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.dense)
    }

    /// Removes an agent and returns it
    pub fn remove_agent(&mut self, handle: AgentHandle) -> Result<Agent> {
        let dense = self
            .dense_index(handle)
            .ok_or_else(|| Error::Agent(format!("stale agent handle {handle:?}")))?;

        let agent = self.agents.swap_remove(dense);
        self.handles.swap_remove(dense);
        if let Some(moved) = self.handles.get(dense) {
            self.slots[moved.index as usize].dense = Some(dense);
        }

        let slot = &mut self.slots[handle.index as usize];
        slot.dense = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index);
        if self.debug_agent == Some(handle) {
            self.debug_agent = None;
        }
        Ok(agent)
    }

    pub fn agent(&self, handle: AgentHandle) -> Option<&Agent> {
        self.dense_index(handle).map(|i| &self.agents[i])
    }

    pub fn agent_mut(&mut self, handle: AgentHandle) -> Option<&mut Agent> {
        self.dense_index(handle).map(|i| &mut self.agents[i])
    }

    /// All agents with their handles
    pub fn agents(&self) -> impl Iterator<Item = (AgentHandle, &Agent)> + '_ {
        self.handles.iter().copied().zip(self.agents.iter())
    }

    /// Sends an agent to `target`; the path is planned on the next update
    pub fn set_destination(&mut self, handle: AgentHandle, target: Vec2) -> Result<()> {
        let tri = self.nav_mesh.get_triangle_from_point(target).ok_or_else(|| {
            Error::Navigation(format!(
                "destination ({:.2}, {:.2}) is not on the walkable mesh",
                target.x, target.y
            ))
        })?;
        let agent = self
            .agent_mut(handle)
            .ok_or_else(|| Error::Agent(format!("stale agent handle {handle:?}")))?;
        agent.set_destination(target, tri);
        Ok(())
    }

    /// Full corner list of an agent's remaining route, for previews
    pub fn path_preview(&self, handle: AgentHandle) -> Result<Vec<Corner>> {
        let agent = self
            .agent(handle)
            .ok_or_else(|| Error::Agent(format!("stale agent handle {handle:?}")))?;
        if agent.corridor.is_empty() {
            return Err(Error::Pathfinding(format!("agent {} has no corridor", agent.id)));
        }
        Ok(self
            .nav_mesh
            .find_corners(&agent.corridor, agent.position, agent.end_target)?)
    }

    /// Selects the agent drawn in detail by [`DebugVisualize::debug_draw`]
    pub fn set_debug_agent(&mut self, handle: Option<AgentHandle>) {
        self.debug_agent = handle;
    }

    /// Applies a command stream, typically written by a host outside the
    /// crowd. Returns the number of commands applied.
    pub fn apply_commands(&mut self, reader: CommandReader<'_>) -> usize {
        apply_command_stream(
            &mut self.agents,
            &self.slots,
            &mut self.query,
            self.config.nav.corner_offset,
            reader,
        )
    }

    /// Advances the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) -> Result<()> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(Error::Config(format!("invalid time step {dt}")));
        }
        self.game_time += dt;
        self.stats.begin_frame();
        self.stats.agents = self.agents.len();

        self.stats.start_pass(FramePass::Brains);
        self.run_brains();

        self.stats.start_pass(FramePass::Navigation);
        {
            let mut ctx = NavContext {
                query: &mut self.query,
                patcher: &mut self.patcher,
                config: &self.config.nav,
                rng: &mut self.rng,
                stats: &mut self.stats,
            };
            for agent in &mut self.agents {
                update_agent_navigation(agent, &mut ctx, dt);
            }
        }

        self.stats.start_pass(FramePass::Physics);
        for agent in &mut self.agents {
            update_agent_physics(agent, self.nav_mesh, &self.config.nav, dt);
            update_agent_statistic(agent, &self.config.nav, dt);
        }

        self.stats.start_pass(FramePass::Collision);
        self.grid.clear_and_reindex(self.agents.iter().map(|a| a.position));
        update_agent_collisions(&mut self.agents, &self.grid, &self.config);
        self.stats.stop_pass();

        self.stats.log_summary();
        Ok(())
    }

    fn run_brains(&mut self) {
        self.commands.begin_frame();
        let mut ctx = BrainContext {
            mesh: self.nav_mesh,
            config: &self.config.nav,
            rng: &mut self.rng,
            game_time: self.game_time,
            commands: &mut self.commands,
            scratch: &mut self.brain_scratch,
        };
        for (agent, handle) in self.agents.iter_mut().zip(&self.handles) {
            if let Err(err) = update_brain(agent, handle.index, &mut ctx) {
                log::warn!("agent {}: brain update dropped: {err}", agent.id);
            }
        }
        self.commands.commit_frame();

        apply_command_stream(
            &mut self.agents,
            &self.slots,
            &mut self.query,
            self.config.nav.corner_offset,
            self.commands.reader(),
        );
    }
}

fn apply_command_stream(
    agents: &mut [Agent],
    slots: &[Slot],
    query: &mut NavMeshQuery<'_>,
    corner_offset: f32,
    reader: CommandReader<'_>,
) -> usize {
    let mut applied = 0;
    for command in reader {
        if command.kind != CMD_SET_CORRIDOR {
            log::error!(
                "unknown command type {}, skipping {} payload words",
                command.kind,
                command.payload.len() / 4
            );
            continue;
        }
        let cmd = match SetCorridor::decode(command.payload) {
            Ok(cmd) => cmd,
            Err(err) => {
                log::error!("{err}");
                continue;
            }
        };
        let Some(agent) = slots
            .get(cmd.agent as usize)
            .and_then(|slot| slot.dense)
            .and_then(|dense| agents.get_mut(dense))
        else {
            log::error!("set corridor command for unknown agent slot {}", cmd.agent);
            continue;
        };
        if apply_set_corridor(agent, cmd, query, corner_offset) {
            applied += 1;
        }
    }
    applied
}

/// Returns false when the corridor was rejected
fn apply_set_corridor(agent: &mut Agent, cmd: SetCorridor, query: &mut NavMeshQuery<'_>, corner_offset: f32) -> bool {
    let mesh = query.nav_mesh();
    if let Some(&bad) = cmd.corridor.iter().find(|&&p| !mesh.is_walkable_polygon(p)) {
        log::error!("agent {}: corridor contains non-walkable polygon {bad}", agent.id);
        return false;
    }

    agent.corridor = cmd.corridor;
    if agent.corridor.is_empty() {
        return true;
    }
    match cmd.action {
        CorridorAction::SetOnly => {}
        CorridorAction::SetAndStraightCorner => agent.set_straight_corner(),
        CorridorAction::SetAndRecalcCorners => {
            match query.find_next_corner(agent.position, &agent.corridor, agent.end_target, corner_offset) {
                Ok(corners) if corners.num_valid > 0 => {
                    agent.set_corners(&corners);
                    agent.path_frustration = 0;
                    agent.last_visible_point = agent.position;
                }
                _ => agent.num_valid_corners = 0,
            }
        }
    }
    true
}

fn state_color(state: NavState) -> Color {
    match state {
        NavState::Standing => NavStateColors::STANDING,
        NavState::Traveling => NavStateColors::TRAVELING,
        NavState::Escaping => NavStateColors::ESCAPING,
    }
}

impl DebugVisualize for Crowd<'_> {
    fn debug_draw(&self, sink: &mut dyn DebugSink) {
        for agent in &self.agents {
            sink.add_point(agent.position, state_color(agent.state));
            if agent.wall_contact {
                sink.add_point(agent.position, NavStateColors::HIT);
            }
        }

        let Some(agent) = self.debug_agent.and_then(|h| self.agent(h)) else {
            return;
        };
        for &poly in &agent.corridor {
            sink.add_area(&self.nav_mesh.poly_points(poly), NavMeshColors::CORRIDOR);
        }
        if agent.num_valid_corners > 0 {
            sink.add_line(agent.position, agent.next_corner, NavStateColors::CORNER);
            sink.add_point(agent.next_corner, NavStateColors::CORNER);
        }
        if agent.num_valid_corners > 1 {
            sink.add_line(agent.next_corner, agent.next_corner2, NavStateColors::CORNER2);
            sink.add_point(agent.next_corner2, NavStateColors::CORNER2);
        }
        sink.add_line(agent.position, agent.position + agent.look * 3.0, Color::WHITE);
        sink.add_text(
            agent.position,
            &format!(
                "#{} {:?} stuck {:.0} pred {}",
                agent.id, agent.state, agent.stuck_rating, agent.predicament_rating
            ),
            Color::WHITE,
        );
    }
}
