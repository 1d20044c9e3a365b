//! Periodic reproduction of the fittest agents.

use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::SimError;
use crate::agent::Agent;

/// Population parameters reported by a [`Seeder`](crate::Seeder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// No reproduction happens while this many agents are alive.
    pub cap: usize,
    /// Milliseconds between reproduction cycles.
    pub interval_ms: u64,
    /// Maximum number of parents per cycle.
    pub batch_size: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            cap: 100,
            interval_ms: 10_000,
            batch_size: 3,
        }
    }
}

impl PopulationConfig {
    /// A zero interval would spin the population worker.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.interval_ms == 0 {
            return Err(SimError::InvalidConfig(
                "population interval_ms must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Chooses which agents reproduce in a cycle.
#[derive(Debug, Clone)]
pub struct PopulationController {
    config: PopulationConfig,
}

impl PopulationController {
    #[must_use]
    pub fn new(config: PopulationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> PopulationConfig {
        self.config
    }

    /// Parents for one cycle: the breeding-eligible living agents ranked by fitness, highest
    /// first (equal fitness keeps snapshot order), limited to the batch size and to the room
    /// left under the cap. Empty once the living population has reached the cap.
    #[must_use]
    pub fn select_parents(&self, agents: &[Arc<Agent>]) -> Vec<Arc<Agent>> {
        let living = agents.iter().filter(|agent| agent.is_alive()).count();
        let Some(room) = self.config.cap.checked_sub(living).filter(|room| *room > 0) else {
            return Vec::new();
        };

        let mut ranked: Vec<(OrderedFloat<f64>, &Arc<Agent>)> = agents
            .iter()
            .filter(|agent| agent.is_breedable())
            .map(|agent| (OrderedFloat(agent.fitness()), agent))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        ranked
            .into_iter()
            .take(self.config.batch_size.min(room))
            .map(|(_, agent)| Arc::clone(agent))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use gridmind_brain::PolicyNetwork;
    use rand::{SeedableRng, rngs::SmallRng};
    use slotmap::SlotMap;

    use super::*;
    use crate::AgentId;
    use crate::agent::{AgentKind, AgentReport, Appearance};
    use crate::direction::Direction;

    fn pool(entries: &[(f64, bool)]) -> Vec<Arc<Agent>> {
        let mut ids: SlotMap<AgentId, ()> = SlotMap::with_key();
        let mut rng = SmallRng::seed_from_u64(1);
        entries
            .iter()
            .map(|&(fitness, breedable)| {
                let report = AgentReport {
                    facing: Direction::Up,
                    fitness,
                    breedable,
                    appearance: Appearance::new('O', [255; 3]),
                    ticks: 0,
                    exploration_rate: 0.5,
                };
                let network = PolicyNetwork::new(2, 2, Direction::COUNT, 0.1, &mut rng);
                Arc::new(Agent::new(
                    ids.insert(()),
                    AgentKind::Survivor,
                    network,
                    0,
                    report,
                ))
            })
            .collect()
    }

    fn controller(cap: usize, batch_size: usize) -> PopulationController {
        PopulationController::new(PopulationConfig {
            cap,
            interval_ms: 1,
            batch_size,
        })
    }

    #[test]
    fn ranks_eligible_agents_by_fitness() {
        let agents = pool(&[(3.0, true), (9.0, true), (5.0, true), (9.0, true), (7.0, false)]);
        let chosen: Vec<AgentId> = controller(100, 3)
            .select_parents(&agents)
            .iter()
            .map(|agent| agent.id())
            .collect();
        assert_eq!(chosen, vec![agents[1].id(), agents[3].id(), agents[2].id()]);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = PopulationConfig {
            interval_ms: 0,
            ..PopulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
        assert!(PopulationConfig::default().validate().is_ok());
    }

    #[test]
    fn never_breeds_past_the_cap() {
        let agents = pool(&[(1.0, true), (2.0, true)]);
        assert!(controller(2, 3).select_parents(&agents).is_empty());
        assert_eq!(controller(3, 3).select_parents(&agents).len(), 1);
        assert_eq!(controller(10, 3).select_parents(&agents).len(), 2);
    }
}
