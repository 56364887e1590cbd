//! Agents steered by small, fixed, randomly initialised neural networks.
//!
//! Each tick an agent senses the shared target, runs its network forward and
//! turns the two outputs into a speed and a heading. Weights never change.

pub mod agent;
pub mod config;
pub mod neuron;
pub mod nn;
pub mod world;

pub use agent::Agent;
pub use config::{Arena, SimConfig, SimConfigError, SteeringParams};
pub use neuron::Neuron;
pub use nn::{Network, NetworkError};
pub use world::{
    AgentSnapshot, ExperimentError, FrameSnapshot, RunSummary, Simulation, SimulationError,
    TargetEvent,
};
