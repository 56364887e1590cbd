use super::{Simulation, SimulationError};
use crate::agent::Agent;
use rand::Rng;
use tracing::debug;

impl Simulation {
    /// Spawn one agent using the simulation's own generator.
    ///
    /// That generator continues from `config.seed` after `new` and
    /// `with_agents`, and from the injected source after `with_rng`.
    pub fn add_agent(&mut self) -> Result<usize, SimulationError> {
        let agent = Agent::random(&self.config, &mut self.rng)?;
        Ok(self.push_agent(agent))
    }

    /// Spawn one agent drawing position and weights from `rng`.
    pub fn add_agent_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<usize, SimulationError> {
        let agent = Agent::random(&self.config, rng)?;
        Ok(self.push_agent(agent))
    }

    /// Append an agent built elsewhere. Returns its index.
    pub fn push_agent(&mut self, agent: Agent) -> usize {
        self.agents.push(agent);
        let index = self.agents.len() - 1;
        debug!(index, position = ?self.agents[index].position(), "agent added");
        index
    }

    /// Remove an agent, preserving the order of the rest.
    pub fn remove_agent(&mut self, index: usize) -> Result<Agent, SimulationError> {
        if index >= self.agents.len() {
            return Err(SimulationError::AgentOutOfRange {
                index,
                len: self.agents.len(),
            });
        }
        let agent = self.agents.remove(index);
        debug!(index, remaining = self.agents.len(), "agent removed");
        Ok(agent)
    }

    pub(crate) fn spawn_agents<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> Result<(), SimulationError> {
        self.agents.reserve(count);
        for _ in 0..count {
            let agent = Agent::random(&self.config, rng)?;
            self.agents.push(agent);
        }
        Ok(())
    }
}
