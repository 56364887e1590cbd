pub mod lifecycle;
pub mod metrics;

pub use metrics::*;

use crate::agent::Agent;
use crate::config::{SimConfig, SimConfigError};
use crate::nn::NetworkError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use std::{error::Error, fmt};
use tracing::{debug, info, trace, warn};

/// Agents chasing one shared target inside a rectangular arena.
///
/// Driven from outside: one `tick` per frame, `set_target` between ticks.
#[derive(Clone, Debug)]
pub struct Simulation {
    pub(crate) agents: Vec<Agent>,
    pub(crate) target: [f64; 2],
    pub(crate) config: SimConfig,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) tick_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Config(SimConfigError),
    Network(NetworkError),
    AgentOutOfRange { index: usize, len: usize },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "{}", e),
            SimulationError::Network(e) => write!(f, "{}", e),
            SimulationError::AgentOutOfRange { index, len } => {
                write!(f, "agent index {index} out of range for {len} agents")
            }
        }
    }
}

impl From<SimConfigError> for SimulationError {
    fn from(err: SimConfigError) -> Self {
        SimulationError::Config(err)
    }
}

impl From<NetworkError> for SimulationError {
    fn from(err: NetworkError) -> Self {
        SimulationError::Network(err)
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            SimulationError::Network(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentError {
    InvalidSampleEvery,
    Tick(SimulationError),
    TooManySteps { max: usize, actual: usize },
    TooManySamples { max: usize, actual: usize },
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            ExperimentError::Tick(e) => write!(f, "tick failed: {e}"),
            ExperimentError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            ExperimentError::TooManySamples { max, actual } => {
                write!(
                    f,
                    "sample count ({actual}) exceeds supported maximum ({max})"
                )
            }
        }
    }
}

impl From<SimulationError> for ExperimentError {
    fn from(err: SimulationError) -> Self {
        ExperimentError::Tick(err)
    }
}

impl Error for ExperimentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExperimentError::Tick(e) => Some(e),
            _ => None,
        }
    }
}

impl Simulation {
    pub const MAX_EXPERIMENT_STEPS: usize = 1_000_000;
    pub const MAX_EXPERIMENT_SAMPLES: usize = 50_000;

    pub fn new(config: SimConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Spawn `config.num_agents` agents from a generator seeded with `config.seed`.
    pub fn try_new(config: SimConfig) -> Result<Self, SimulationError> {
        let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
        let count = config.num_agents;
        let mut sim = Self::empty(config)?;
        sim.spawn_agents(count, &mut rng)?;
        sim.rng = rng;
        debug!(
            agents = sim.agents.len(),
            seed = sim.config.seed,
            "simulation spawned"
        );
        Ok(sim)
    }

    pub fn with_rng<R: Rng + ?Sized>(config: SimConfig, rng: &mut R) -> Self {
        Self::try_with_rng(config, rng).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Spawn `config.num_agents` agents drawing from a caller-supplied source.
    ///
    /// The internal generator used by `add_agent` is then seeded from the
    /// same source, so later spawns continue from it.
    pub fn try_with_rng<R: Rng + ?Sized>(
        config: SimConfig,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        let count = config.num_agents;
        let mut sim = Self::empty(config)?;
        sim.spawn_agents(count, rng)?;
        sim.rng = ChaCha12Rng::seed_from_u64(rng.random::<u64>());
        Ok(sim)
    }

    pub fn with_agents(config: SimConfig, agents: Vec<Agent>) -> Self {
        Self::try_with_agents(config, agents).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Wrap pre-built agents. `config.num_agents` is ignored.
    ///
    /// Each agent takes its bounding box and steering scales from `config`;
    /// position, speed and brain are kept. The generator used by `add_agent`
    /// is seeded from `config.seed`.
    pub fn try_with_agents(
        config: SimConfig,
        agents: Vec<Agent>,
    ) -> Result<Self, SimulationError> {
        let mut sim = Self::empty(config)?;
        sim.agents = agents
            .into_iter()
            .map(|agent| agent.configured(&sim.config))
            .collect();
        Ok(sim)
    }

    fn empty(config: SimConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            agents: Vec::new(),
            target: config.initial_target,
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            config,
            tick_index: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn target(&self) -> [f64; 2] {
        self.target
    }

    /// Any coordinate is accepted, including points outside the arena.
    pub fn set_target(&mut self, target: [f64; 2]) {
        trace!(x = target[0], y = target[1], "target moved");
        self.target = target;
    }

    /// Completed ticks since construction.
    pub fn tick_index(&self) -> usize {
        self.tick_index
    }

    pub fn tick(&mut self) {
        self.try_tick().unwrap_or_else(|e| panic!("{e}"))
    }

    /// Advance every agent one step toward the current target.
    ///
    /// All brains are evaluated before any agent moves, so an error leaves
    /// every agent untouched.
    pub fn try_tick(&mut self) -> Result<(), SimulationError> {
        let target = self.target;
        let plans = self
            .agents
            .iter()
            .map(|agent| agent.plan(target))
            .collect::<Result<Vec<_>, _>>()?;
        self.apply_plans(&plans)
    }

    pub fn tick_parallel(&mut self) {
        self.try_tick_parallel().unwrap_or_else(|e| panic!("{e}"))
    }

    /// Same result as `try_tick`, with brain evaluation spread over the rayon pool.
    pub fn try_tick_parallel(&mut self) -> Result<(), SimulationError> {
        let target = self.target;
        let plans = self
            .agents
            .par_iter()
            .map(|agent| agent.plan(target))
            .collect::<Result<Vec<_>, _>>()?;
        self.apply_plans(&plans)
    }

    fn apply_plans(&mut self, plans: &[Vec<f32>]) -> Result<(), SimulationError> {
        let arena = self.config.arena();
        for (agent, outputs) in self.agents.iter_mut().zip(plans) {
            agent.act(outputs, arena)?;
        }
        self.tick_index += 1;
        Ok(())
    }

    pub fn run_experiment(
        &mut self,
        steps: usize,
        sample_every: usize,
        schedule: &[TargetEvent],
    ) -> RunSummary {
        self.try_run_experiment(steps, sample_every, schedule)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Tick `steps` times, replaying `schedule` and sampling a frame every
    /// `sample_every` ticks plus the final one.
    pub fn try_run_experiment(
        &mut self,
        steps: usize,
        sample_every: usize,
        schedule: &[TargetEvent],
    ) -> Result<RunSummary, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if steps > Self::MAX_EXPERIMENT_STEPS {
            return Err(ExperimentError::TooManySteps {
                max: Self::MAX_EXPERIMENT_STEPS,
                actual: steps,
            });
        }
        let estimated_samples = if steps == 0 {
            0
        } else {
            ((steps - 1) / sample_every) + 1
        };
        if estimated_samples > Self::MAX_EXPERIMENT_SAMPLES {
            return Err(ExperimentError::TooManySamples {
                max: Self::MAX_EXPERIMENT_SAMPLES,
                actual: estimated_samples,
            });
        }

        let mut events = schedule.to_vec();
        events.sort_by_key(|e| e.step);
        let late = events.iter().filter(|e| e.step > steps).count();
        if late > 0 {
            warn!(late, steps, "target events scheduled after the last step are ignored");
        }
        let mut pending = events.into_iter().filter(|e| e.step <= steps).peekable();

        let initial_frame = self.frame();
        let mut frames = Vec::with_capacity(estimated_samples);
        let mut applied = 0usize;
        for step in 1..=steps {
            while let Some(event) = pending.next_if(|e| e.step <= step) {
                self.set_target([event.x, event.y]);
                applied += 1;
            }
            if self.config.parallel_tick {
                self.try_tick_parallel()?;
            } else {
                self.try_tick()?;
            }
            if step % sample_every == 0 || step == steps {
                frames.push(self.frame());
            }
        }
        info!(
            steps,
            samples = frames.len(),
            target_events = applied,
            "experiment finished"
        );
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            config: self.config.clone(),
            initial_frame,
            frames,
            target_events_applied: applied,
        })
    }
}
