//! Per-frame timings and navigation event counters

use std::time::Duration;
use web_time::Instant;

/// Passes of one crowd update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePass {
    /// Brain decisions
    Brains,
    /// Navigation state machine
    Navigation,
    /// Steering and movement
    Physics,
    /// Grid rebuild and agent-agent collision
    Collision,
}

/// Timings and counters of the last crowd update
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Frames started since creation
    pub frame: u64,
    pub brains: Duration,
    pub navigation: Duration,
    pub physics: Duration,
    pub collision: Duration,
    /// Agents updated
    pub agents: usize,
    /// Full corridor searches run
    pub repaths: u32,
    /// Successful raycast shortcuts and local repairs
    pub patches: u32,
    /// Agents that fell off the mesh
    pub escapes: u32,
    /// Corridor searches or corner extractions that failed
    pub path_failures: u32,
    active: Option<(FramePass, Instant)>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the previous frame and advances the frame counter
    pub fn begin_frame(&mut self) {
        *self = Self {
            frame: self.frame + 1,
            ..Self::default()
        };
    }

    /// Starts timing `pass`, stopping any pass still running
    pub fn start_pass(&mut self, pass: FramePass) {
        self.stop_pass();
        self.active = Some((pass, Instant::now()));
    }

    /// Stops the running pass and records its duration
    pub fn stop_pass(&mut self) {
        if let Some((pass, start)) = self.active.take() {
            *self.slot(pass) += start.elapsed();
        }
    }

    /// Recorded duration of `pass`
    pub fn pass_duration(&self, pass: FramePass) -> Duration {
        match pass {
            FramePass::Brains => self.brains,
            FramePass::Navigation => self.navigation,
            FramePass::Physics => self.physics,
            FramePass::Collision => self.collision,
        }
    }

    /// Sum of all pass durations
    pub fn total(&self) -> Duration {
        self.brains + self.navigation + self.physics + self.collision
    }

    fn slot(&mut self, pass: FramePass) -> &mut Duration {
        match pass {
            FramePass::Brains => &mut self.brains,
            FramePass::Navigation => &mut self.navigation,
            FramePass::Physics => &mut self.physics,
            FramePass::Collision => &mut self.collision,
        }
    }

    /// Logs a one-line summary at debug level
    pub fn log_summary(&self) {
        log::debug!(
            "frame {}: {} agents, nav {:?}, phys {:?}, coll {:?}, {} repaths, {} patches, {} escapes, {} failures",
            self.frame,
            self.agents,
            self.navigation,
            self.physics,
            self.collision,
            self.repaths,
            self.patches,
            self.escapes,
            self.path_failures
        );
    }
}
