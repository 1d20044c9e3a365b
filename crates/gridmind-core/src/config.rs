//! Static configuration for a gridmind world.

use gridmind_brain::LearningStrategy;
use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::SimError;

/// Where the population controller places offspring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPlacement {
    /// Diagonally below-right of the parent, or the first free neighbouring cell.
    #[default]
    Near,
    /// Any cell not holding an agent.
    Random,
}

/// Settings shared by every agent variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Step size used by network training.
    pub learning_rate: f64,
    /// Exploration rate of agents created by seeding.
    pub initial_exploration_rate: f64,
    /// Amount removed from the exploration rate at each decay.
    pub exploration_decay_step: f64,
    /// The exploration rate never decays below this value.
    pub exploration_floor: f64,
    /// Ticks between exploration decays.
    pub exploration_decay_cadence: u64,
    /// Every this many ticks the agent learns instead of acting.
    pub meditation_cadence: u64,
    /// Number of experiences retained (oldest evicted first).
    pub memory_capacity: usize,
    /// Single-sample updates performed per learning pass.
    pub learning_epochs: usize,
    /// Exploration rate given to offspring.
    pub child_exploration_rate: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            initial_exploration_rate: 0.95,
            exploration_decay_step: 0.05,
            exploration_floor: 0.05,
            exploration_decay_cadence: 100,
            meditation_cadence: 100,
            memory_capacity: 1000,
            learning_epochs: 10,
            child_exploration_rate: 0.05,
        }
    }
}

/// Tuning for agents that manage hunger, thirst, isolation and energy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivorConfig {
    pub hidden_size: usize,
    pub learning: LearningStrategy,
    pub starting_energy: f64,
    /// Hunger or thirst above this value is fatal.
    pub death_ceiling: f64,
    /// Food or water is only taken when the matching need exceeds this value.
    pub consumption_threshold: f64,
    pub food_relief: f64,
    pub water_relief: f64,
    /// Energy gained by eating.
    pub food_energy: f64,
    /// Isolation removed while another agent is within reach.
    pub company_relief: f64,
    /// Energy regained by standing still.
    pub rest_energy: f64,
    /// Energy spent by any other move.
    pub move_cost: f64,
    /// A dominant need must exceed this to count as the primary concern.
    pub primary_concern_floor: f64,
    /// A non-primary need must exceed this to earn the secondary bonus.
    pub secondary_concern_floor: f64,
    pub primary_bonus: f64,
    pub secondary_bonus: f64,
    /// Breeding requires every need below this value.
    pub breeding_ceiling: f64,
    /// A need above this value tints the agent's display colour.
    pub distress_display: f64,
}

impl Default for SurvivorConfig {
    fn default() -> Self {
        Self {
            hidden_size: 150,
            learning: LearningStrategy::discounted(),
            starting_energy: 500.0,
            death_ceiling: 1000.0,
            consumption_threshold: 100.0,
            food_relief: 20.0,
            water_relief: 20.0,
            food_energy: 20.0,
            company_relief: 100.0,
            rest_energy: 100.0,
            move_cost: 1.0,
            primary_concern_floor: 100.0,
            secondary_concern_floor: 200.0,
            primary_bonus: 10.0,
            secondary_bonus: 0.0,
            breeding_ceiling: 200.0,
            distress_display: 200.0,
        }
    }
}

/// Tuning for team-based combat agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterConfig {
    pub hidden_size: usize,
    pub learning: LearningStrategy,
    pub starting_health: i64,
    pub hit_damage: i64,
    /// Reward for winning at least one fight in a tick.
    pub win_bonus: f64,
    /// Reward for ending a tick without losing health.
    pub unharmed_bonus: f64,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            hidden_size: 100,
            learning: LearningStrategy::RewardOnly,
            starting_health: 100,
            hit_damage: 10,
            win_bonus: 10.0,
            unharmed_bonus: 1.0,
        }
    }
}

/// Static configuration for a gridmind world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
    /// Pause between two ticks of the same agent, in milliseconds.
    pub tick_pause_ms: u64,
    /// Chebyshev radius within which agents eat, drink, socialise and fight.
    pub interaction_radius: usize,
    /// Placement rule for offspring.
    pub spawn_placement: SpawnPlacement,
    pub agent: AgentConfig,
    pub survivor: SurvivorConfig,
    pub fighter: FighterConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 75,
            height: 300,
            rng_seed: None,
            tick_pause_ms: 10,
            interaction_radius: 1,
            spawn_placement: SpawnPlacement::Near,
            agent: AgentConfig::default(),
            survivor: SurvivorConfig::default(),
            fighter: FighterConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Default configuration with the given grid size.
    #[must_use]
    pub fn with_dimensions(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidConfig(
                "world width and height must be positive",
            ));
        }
        if self.interaction_radius == 0 {
            return Err(SimError::InvalidConfig(
                "interaction_radius must be at least 1",
            ));
        }
        let agent = &self.agent;
        if agent.meditation_cadence == 0 || agent.exploration_decay_cadence == 0 {
            return Err(SimError::InvalidConfig(
                "meditation and exploration cadences must be positive",
            ));
        }
        let rates = [
            agent.initial_exploration_rate,
            agent.exploration_floor,
            agent.child_exploration_rate,
        ];
        if rates.iter().any(|rate| !(0.0..=1.0).contains(rate)) {
            return Err(SimError::InvalidConfig(
                "exploration rates must lie in [0, 1]",
            ));
        }
        if agent.exploration_decay_step < 0.0 || agent.learning_rate <= 0.0 {
            return Err(SimError::InvalidConfig(
                "learning_rate must be positive and exploration_decay_step non-negative",
            ));
        }
        if self.survivor.hidden_size == 0 || self.fighter.hidden_size == 0 {
            return Err(SimError::InvalidConfig("hidden layer sizes must be positive"));
        }
        if self.survivor.starting_energy < 0.0 || self.survivor.death_ceiling <= 0.0 {
            return Err(SimError::InvalidConfig(
                "starting_energy must be non-negative and death_ceiling positive",
            ));
        }
        if self.fighter.starting_health <= 0 || self.fighter.hit_damage < 0 {
            return Err(SimError::InvalidConfig(
                "starting_health must be positive and hit_damage non-negative",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG, generating a seed from entropy if absent.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        WorldConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn rejects_zero_cadence() {
        let mut config = WorldConfig::with_dimensions(10, 10);
        config.agent.meditation_cadence = 0;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: WorldConfig = serde_json::from_str(
            r#"{ "width": 40, "height": 20, "survivor": { "learning": { "kind": "reward_only" } } }"#,
        )
        .expect("parse");
        assert_eq!((config.height, config.width), (20, 40));
        assert_eq!(config.survivor.learning, LearningStrategy::RewardOnly);
        assert_eq!(config.survivor.hidden_size, 150);
        assert_eq!(config.agent.memory_capacity, 1000);
    }
}
