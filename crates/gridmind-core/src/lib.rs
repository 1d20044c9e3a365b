//! Core simulation for gridmind: a toroidal grid of resources and learning agents.
//!
//! Every agent runs on its own worker thread, perceiving a fan of sight lines, choosing a
//! direction with its [`PolicyNetwork`](gridmind_brain::PolicyNetwork), and periodically
//! retraining on remembered experiences. A population controller clones the fittest agents
//! while the population is below its cap. All grid mutations go through [`Grid`], which keeps
//! the occupant cells and the location index consistent under a single lock.

use thiserror::Error;

pub mod agent;
pub mod config;
pub mod direction;
pub mod grid;
pub mod occupant;
pub mod population;
pub mod seed;
pub mod world;

pub use agent::{Agent, AgentKind, AgentReport, Appearance};
pub use config::{AgentConfig, FighterConfig, SpawnPlacement, SurvivorConfig, WorldConfig};
pub use direction::Direction;
pub use gridmind_index::{Cell, Dimensions};
pub use grid::{Grid, GridState};
pub use occupant::{Occupant, OccupantCode, Resource, ResourceKind};
pub use population::{PopulationConfig, PopulationController};
pub use seed::{
    BattleRoyaleSeeder, FarmSeeder, FoodOnlySeeder, RandomWorldSeeder, RiverSeeder, Seeder,
    Seeding, SoloActorSeeder,
};
pub use world::{PopulationSummary, World};

slotmap::new_key_type! {
    /// Stable handle referencing an agent in the location index.
    pub struct AgentId;
}

/// Errors raised by the simulation runtime.
#[derive(Debug, Error)]
pub enum SimError {
    /// Matrix or training failure inside an agent's network.
    #[error(transparent)]
    Brain(#[from] gridmind_brain::BrainError),
    /// Location lookup failure, typically an agent that has already been removed.
    #[error(transparent)]
    Index(#[from] gridmind_index::IndexError),
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A worker thread could not be started.
    #[error("failed to start worker: {0}")]
    Worker(#[source] std::io::Error),
}

/// Lock a mutex, recovering the data if a worker panicked while holding it.
pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
