//! Steering agent: a position, a speed and a fixed random brain.
//!
//! Sensors: distance to target, angle to target, current speed, and one unused
//! channel held at zero. Actuators: speed and heading, both taken straight from
//! the tanh outputs and scaled by `SteeringParams`.
//!
//! Speed is whatever the network says it is, including negative values. A
//! negative speed moves the agent opposite to its heading. This is kept as-is.

use crate::config::{Arena, SimConfig, SteeringParams};
use crate::nn::{Network, NetworkError};
use rand::Rng;

pub const SENSOR_COUNT: usize = 4;
pub const ACTUATOR_COUNT: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    position: [f64; 2],
    speed: f64,
    brain: Network,
    bounding_box: [f64; 2],
    steering: SteeringParams,
}

impl Agent {
    pub fn new(position: [f64; 2], speed: f64, brain: Network) -> Self {
        let defaults = SimConfig::default();
        Self {
            position,
            speed,
            brain,
            bounding_box: defaults.bounding_box,
            steering: defaults.steering(),
        }
    }

    /// Spawn with a uniform random position inside the clamp region and a
    /// freshly drawn brain. Position is drawn before weights.
    pub fn random<R: Rng + ?Sized>(
        config: &SimConfig,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        let [max_x, max_y] = config.position_limit();
        let position = [
            rng.random::<f64>() * max_x,
            rng.random::<f64>() * max_y,
        ];
        let brain = Network::random(&config.topology, rng)?;
        Ok(Self::new(position, config.initial_speed, brain).configured(config))
    }

    /// Adopt the bounding box and steering scales of `config`.
    pub fn configured(mut self, config: &SimConfig) -> Self {
        self.bounding_box = config.bounding_box;
        self.steering = config.steering();
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: [f64; 2]) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    pub fn with_steering(mut self, steering: SteeringParams) -> Self {
        self.steering = steering;
        self
    }

    pub fn position(&self) -> [f64; 2] {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn brain(&self) -> &Network {
        &self.brain
    }

    pub fn bounding_box(&self) -> [f64; 2] {
        self.bounding_box
    }

    pub fn steering(&self) -> &SteeringParams {
        &self.steering
    }

    /// Integer draw rectangle `[x, y, w, h]` with the position truncated.
    pub fn sprite_rect(&self) -> [i32; 4] {
        [
            self.position[0] as i32,
            self.position[1] as i32,
            self.bounding_box[0] as i32,
            self.bounding_box[1] as i32,
        ]
    }

    /// Network inputs for the current state relative to `target`.
    pub fn sense(&self, target: [f64; 2]) -> [f32; SENSOR_COUNT] {
        let dx = target[0] - self.position[0];
        let dy = target[1] - self.position[1];
        let distance = (dx * dx + dy * dy).sqrt();
        // atan2(0, 0) == 0 when the agent sits on the target.
        let angle = dy.atan2(dx);
        [
            (distance / self.steering.distance_norm) as f32,
            (angle / self.steering.angle_norm) as f32,
            (self.speed / self.steering.speed_norm) as f32,
            0.0,
        ]
    }

    /// Sense and evaluate the brain without touching any state.
    pub fn plan(&self, target: [f64; 2]) -> Result<Vec<f32>, NetworkError> {
        let outputs = self.brain.try_forward(&self.sense(target))?;
        if outputs.len() != ACTUATOR_COUNT {
            return Err(NetworkError::DimensionMismatch {
                expected: ACTUATOR_COUNT,
                actual: outputs.len(),
            });
        }
        Ok(outputs)
    }

    /// Turn network outputs into a new speed and a clamped position.
    pub fn act(&mut self, outputs: &[f32], arena: Arena) -> Result<(), NetworkError> {
        let &[throttle, heading] = outputs else {
            return Err(NetworkError::DimensionMismatch {
                expected: ACTUATOR_COUNT,
                actual: outputs.len(),
            });
        };
        self.speed = throttle as f64 * self.steering.max_speed;
        let direction = heading as f64 * self.steering.max_turn;

        let x = self.position[0] + direction.cos() * self.speed;
        let y = self.position[1] + direction.sin() * self.speed;
        let max_x = (arena.width - self.bounding_box[0]).max(0.0);
        let max_y = (arena.height - self.bounding_box[1]).max(0.0);
        self.position = [x.clamp(0.0, max_x), y.clamp(0.0, max_y)];
        Ok(())
    }

    /// One sense → think → act step. Panics on a brain wired for the wrong
    /// number of sensors or actuators.
    pub fn tick(&mut self, target: [f64; 2], arena: Arena) {
        self.try_tick(target, arena).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_tick(&mut self, target: [f64; 2], arena: Arena) -> Result<(), NetworkError> {
        let outputs = self.plan(target)?;
        self.act(&outputs, arena)
    }
}
