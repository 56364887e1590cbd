use super::Simulation;
use crate::agent::Agent;
use crate::config::SimConfig;
use serde::{Deserialize, Serialize};

/// Side length of the square drawn over the target.
pub const TARGET_MARKER_SIZE: f64 = 40.0;

/// What a renderer needs to draw one agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub position: [f64; 2],
    pub speed: f64,
    pub bounding_box: [f64; 2],
    pub sprite_rect: [i32; 4],
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            position: agent.position(),
            speed: agent.speed(),
            bounding_box: agent.bounding_box(),
            sprite_rect: agent.sprite_rect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: usize,
    pub target: [f64; 2],
    pub target_marker: [i32; 4],
    pub agents: Vec<AgentSnapshot>,
    pub mean_distance_to_target: f64,
}

/// A pointer event replayed during a headless run. Applied just before the
/// tick numbered `step` (1-based); `step == 0` applies before the first tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetEvent {
    pub step: usize,
    pub x: f64,
    pub y: f64,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub config: SimConfig,
    pub initial_frame: FrameSnapshot,
    pub frames: Vec<FrameSnapshot>,
    #[serde(default)]
    pub target_events_applied: usize,
}

impl Simulation {
    pub fn target_marker_rect(&self) -> [i32; 4] {
        let half = TARGET_MARKER_SIZE / 2.0;
        [
            (self.target[0] - half) as i32,
            (self.target[1] - half) as i32,
            TARGET_MARKER_SIZE as i32,
            TARGET_MARKER_SIZE as i32,
        ]
    }

    pub fn mean_distance_to_target(&self) -> f64 {
        if self.agents.is_empty() {
            return 0.0;
        }
        let [tx, ty] = self.target;
        let sum: f64 = self
            .agents
            .iter()
            .map(|a| {
                let [x, y] = a.position();
                ((tx - x).powi(2) + (ty - y).powi(2)).sqrt()
            })
            .sum();
        sum / self.agents.len() as f64
    }

    /// Read-only view of the current state for a renderer.
    pub fn frame(&self) -> FrameSnapshot {
        FrameSnapshot {
            tick: self.tick_index,
            target: self.target,
            target_marker: self.target_marker_rect(),
            agents: self.agents.iter().map(AgentSnapshot::from).collect(),
            mean_distance_to_target: self.mean_distance_to_target(),
        }
    }
}
