use crate::agent::{ACTUATOR_COUNT, SENSOR_COUNT};
use crate::nn::{Network, NetworkError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::{error::Error, fmt};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the generator that draws spawn positions and network weights.
    pub seed: u64,
    /// Arena width in pixels.
    pub arena_width: f64,
    /// Arena height in pixels.
    pub arena_height: f64,
    /// Number of agents spawned by `Simulation::new`.
    pub num_agents: usize,
    /// Network layer sizes, input layer first.
    pub topology: Vec<usize>,
    /// Speed every agent starts with.
    pub initial_speed: f64,
    /// Agent sprite size `[w, h]`; positions are clamped so the box stays inside the arena.
    pub bounding_box: [f64; 2],
    /// Divisor for the distance-to-target sensor.
    pub distance_norm: f64,
    /// Divisor for the angle-to-target sensor.
    pub angle_norm: f64,
    /// Divisor for the current-speed sensor.
    pub speed_norm: f64,
    /// Multiplier mapping output 0 to speed.
    pub max_speed: f64,
    /// Multiplier mapping output 1 to heading in radians.
    pub max_turn: f64,
    /// Target position before any input event arrives.
    pub initial_target: [f64; 2],
    /// Evaluate brains on the rayon pool during experiment runs.
    pub parallel_tick: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            arena_width: 800.0,
            arena_height: 600.0,
            num_agents: 5,
            topology: vec![SENSOR_COUNT, 6, ACTUATOR_COUNT],
            initial_speed: 2.0,
            bounding_box: [40.0, 40.0],
            distance_norm: 800.0,
            angle_norm: PI,
            speed_norm: 5.0,
            max_speed: 5.0,
            max_turn: PI,
            initial_target: [400.0, 300.0],
            parallel_tick: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimConfigError {
    InvalidArena { width: f64, height: f64 },
    InvalidBoundingBox { width: f64, height: f64 },
    BoundingBoxExceedsArena,
    InvalidNormalization(&'static str),
    InvalidInitialSpeed(f64),
    InvalidInitialTarget,
    Topology(NetworkError),
    SensorCountMismatch { expected: usize, actual: usize },
    ActuatorCountMismatch { expected: usize, actual: usize },
    TooManyAgents { max: usize, actual: usize },
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::InvalidArena { width, height } => write!(
                f,
                "arena size must be finite and positive, got {width}x{height}"
            ),
            SimConfigError::InvalidBoundingBox { width, height } => write!(
                f,
                "bounding box must be finite and non-negative, got {width}x{height}"
            ),
            SimConfigError::BoundingBoxExceedsArena => {
                write!(f, "bounding box must fit inside the arena")
            }
            SimConfigError::InvalidNormalization(name) => {
                write!(f, "{name} must be finite and non-zero")
            }
            SimConfigError::InvalidInitialSpeed(speed) => {
                write!(f, "initial_speed must be finite and non-negative, got {speed}")
            }
            SimConfigError::InvalidInitialTarget => {
                write!(f, "initial_target must have finite coordinates")
            }
            SimConfigError::Topology(e) => write!(f, "invalid topology: {e}"),
            SimConfigError::SensorCountMismatch { expected, actual } => write!(
                f,
                "topology input layer must have {expected} neurons (one per sensor), got {actual}"
            ),
            SimConfigError::ActuatorCountMismatch { expected, actual } => write!(
                f,
                "topology output layer must have {expected} neurons (speed, heading), got {actual}"
            ),
            SimConfigError::TooManyAgents { max, actual } => {
                write!(f, "num_agents ({actual}) exceeds supported maximum ({max})")
            }
        }
    }
}

impl From<NetworkError> for SimConfigError {
    fn from(err: NetworkError) -> Self {
        SimConfigError::Topology(err)
    }
}

impl Error for SimConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimConfigError::Topology(e) => Some(e),
            _ => None,
        }
    }
}

impl SimConfig {
    pub const MAX_AGENTS: usize = 100_000;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        let (w, h) = (self.arena_width, self.arena_height);
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(SimConfigError::InvalidArena {
                width: w,
                height: h,
            });
        }
        let [bw, bh] = self.bounding_box;
        if !(bw.is_finite() && bh.is_finite() && bw >= 0.0 && bh >= 0.0) {
            return Err(SimConfigError::InvalidBoundingBox {
                width: bw,
                height: bh,
            });
        }
        if bw > w || bh > h {
            return Err(SimConfigError::BoundingBoxExceedsArena);
        }
        for (name, value) in [
            ("distance_norm", self.distance_norm),
            ("angle_norm", self.angle_norm),
            ("speed_norm", self.speed_norm),
            ("max_speed", self.max_speed),
            ("max_turn", self.max_turn),
        ] {
            if !value.is_finite() || value == 0.0 {
                return Err(SimConfigError::InvalidNormalization(name));
            }
        }
        if !self.initial_speed.is_finite() || self.initial_speed < 0.0 {
            return Err(SimConfigError::InvalidInitialSpeed(self.initial_speed));
        }
        if !self.initial_target.iter().all(|v| v.is_finite()) {
            return Err(SimConfigError::InvalidInitialTarget);
        }
        Network::validate_topology(&self.topology)?;
        let inputs = self.topology[0];
        if inputs != SENSOR_COUNT {
            return Err(SimConfigError::SensorCountMismatch {
                expected: SENSOR_COUNT,
                actual: inputs,
            });
        }
        let outputs = self.topology[self.topology.len() - 1];
        if outputs != ACTUATOR_COUNT {
            return Err(SimConfigError::ActuatorCountMismatch {
                expected: ACTUATOR_COUNT,
                actual: outputs,
            });
        }
        if self.num_agents > Self::MAX_AGENTS {
            return Err(SimConfigError::TooManyAgents {
                max: Self::MAX_AGENTS,
                actual: self.num_agents,
            });
        }
        Ok(())
    }

    /// Upper corner of the region an agent's position may occupy.
    pub fn position_limit(&self) -> [f64; 2] {
        [
            self.arena_width - self.bounding_box[0],
            self.arena_height - self.bounding_box[1],
        ]
    }

    pub fn arena(&self) -> Arena {
        Arena {
            width: self.arena_width,
            height: self.arena_height,
        }
    }

    pub fn steering(&self) -> SteeringParams {
        SteeringParams {
            distance_norm: self.distance_norm,
            angle_norm: self.angle_norm,
            speed_norm: self.speed_norm,
            max_speed: self.max_speed,
            max_turn: self.max_turn,
        }
    }
}

/// Rectangular arena with its origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Scales between world units and network units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteeringParams {
    pub distance_norm: f64,
    pub angle_norm: f64,
    pub speed_norm: f64,
    pub max_speed: f64,
    pub max_turn: f64,
}

impl Default for SteeringParams {
    fn default() -> Self {
        SimConfig::default().steering()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn defaults_match_reference_constants() {
        let c = SimConfig::default();
        assert_eq!(c.topology, vec![4, 6, 2]);
        assert_eq!(c.initial_speed, 2.0);
        assert_eq!(c.bounding_box, [40.0, 40.0]);
        assert_eq!(c.position_limit(), [760.0, 560.0]);
        assert_eq!(c.distance_norm, 800.0);
        assert_eq!(c.speed_norm, 5.0);
        assert_eq!(c.angle_norm, PI);
    }

    #[test]
    fn rejects_bad_arena() {
        let c = SimConfig {
            arena_width: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(c.validate(), Err(SimConfigError::InvalidArena { .. })));
        let c = SimConfig {
            arena_height: f64::NAN,
            ..SimConfig::default()
        };
        assert!(matches!(c.validate(), Err(SimConfigError::InvalidArena { .. })));
    }

    #[test]
    fn rejects_box_larger_than_arena() {
        let c = SimConfig {
            bounding_box: [900.0, 40.0],
            ..SimConfig::default()
        };
        assert_eq!(c.validate(), Err(SimConfigError::BoundingBoxExceedsArena));
    }

    #[test]
    fn rejects_zero_normalization() {
        let c = SimConfig {
            speed_norm: 0.0,
            ..SimConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(SimConfigError::InvalidNormalization("speed_norm"))
        );
    }

    #[test]
    fn rejects_negative_or_nan_initial_speed() {
        for speed in [-3.0, f64::NAN] {
            let c = SimConfig {
                initial_speed: speed,
                ..SimConfig::default()
            };
            assert!(matches!(
                c.validate(),
                Err(SimConfigError::InvalidInitialSpeed(s)) if s.to_bits() == speed.to_bits()
            ));
        }
        let stopped = SimConfig {
            initial_speed: 0.0,
            ..SimConfig::default()
        };
        assert_eq!(stopped.validate(), Ok(()));
    }

    #[test]
    fn rejects_invalid_topology() {
        let c = SimConfig {
            topology: vec![4],
            ..SimConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(SimConfigError::Topology(NetworkError::TooFewLayers { actual: 1 }))
        );
        let c = SimConfig {
            topology: vec![4, 0, 2],
            ..SimConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(SimConfigError::Topology(NetworkError::EmptyLayer { index: 1 }))
        );
    }

    #[test]
    fn rejects_topology_not_wired_to_sensors() {
        let c = SimConfig {
            topology: vec![3, 6, 2],
            ..SimConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(SimConfigError::SensorCountMismatch {
                expected: 4,
                actual: 3
            })
        );
        let c = SimConfig {
            topology: vec![4, 6, 3],
            ..SimConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(SimConfigError::ActuatorCountMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn deeper_topologies_are_accepted() {
        let c = SimConfig {
            topology: vec![4, 8, 8, 2],
            ..SimConfig::default()
        };
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: SimConfig =
            serde_json::from_str(r#"{"arena_width": 1024.0, "num_agents": 12}"#).unwrap();
        assert_eq!(c.arena_width, 1024.0);
        assert_eq!(c.num_agents, 12);
        assert_eq!(c.arena_height, 600.0);
        assert_eq!(c.topology, vec![4, 6, 2]);
    }
}
