//! Learning agents.
//!
//! An [`Agent`] is the shared handle other threads see: identity, variant, liveness, health,
//! the published [`AgentReport`] and the policy network. The per-tick loop lives in
//! [`Life`], which a single worker thread owns exclusively. Variant-specific rules
//! (observation encoding, resource or combat resolution, reward, death and breeding
//! predicates) are supplied by a [`Behaviour`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use gridmind_brain::{LearningStrategy, PolicyNetwork, TrainingData};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AgentConfig, WorldConfig};
use crate::direction::{Direction, SIGHT_LINES};
use crate::grid::Grid;
use crate::{AgentId, SimError, lock};

mod fighter;
pub mod memory;
mod survivor;

use fighter::Fighter;
use memory::{Experience, Memory};
use survivor::Survivor;

/// Network inputs: one code per sight line plus two vitals-derived values.
pub const POLICY_INPUTS: usize = SIGHT_LINES + 2;

/// Agent variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum AgentKind {
    /// Balances hunger, thirst, isolation and energy.
    Survivor,
    /// Fights agents of other teams.
    Fighter { team: u8 },
}

/// Display glyph and RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub glyph: char,
    pub color: [u8; 3],
}

impl Appearance {
    #[must_use]
    pub const fn new(glyph: char, color: [u8; 3]) -> Self {
        Self { glyph, color }
    }
}

/// Read-only state an agent publishes after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    pub facing: Direction,
    /// Running total of rewards.
    pub fitness: f64,
    pub breedable: bool,
    pub appearance: Appearance,
    pub ticks: u64,
    pub exploration_rate: f64,
}

/// Shared handle to an agent.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    alive: AtomicBool,
    health: AtomicI64,
    brain: Mutex<PolicyNetwork>,
    report: Mutex<AgentReport>,
}

impl Agent {
    pub(crate) fn new(
        id: AgentId,
        kind: AgentKind,
        network: PolicyNetwork,
        health: i64,
        report: AgentReport,
    ) -> Self {
        Self {
            id,
            kind,
            alive: AtomicBool::new(true),
            health: AtomicI64::new(health),
            brain: Mutex::new(network),
            report: Mutex::new(report),
        }
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    #[must_use]
    pub fn team(&self) -> Option<u8> {
        match self.kind {
            AgentKind::Fighter { team } => Some(team),
            AgentKind::Survivor => None,
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn health(&self) -> i64 {
        self.health.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn report(&self) -> AgentReport {
        *lock(&self.report)
    }

    #[must_use]
    pub fn facing(&self) -> Direction {
        self.report().facing
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.report().fitness
    }

    #[must_use]
    pub fn is_breedable(&self) -> bool {
        self.is_alive() && self.report().breedable
    }

    #[must_use]
    pub fn appearance(&self) -> Appearance {
        self.report().appearance
    }

    /// Deep copy of the current policy network.
    #[must_use]
    pub fn network(&self) -> PolicyNetwork {
        self.brain().clone()
    }

    /// Subtract `damage` from health and return what is left.
    pub(crate) fn take_hit(&self, damage: i64) -> i64 {
        self.health.fetch_sub(damage, Ordering::AcqRel) - damage
    }

    pub(crate) fn kill(&self) {
        self.alive.store(false, Ordering::Release);
    }

    fn publish(&self, report: AgentReport) {
        *lock(&self.report) = report;
    }

    fn brain(&self) -> MutexGuard<'_, PolicyNetwork> {
        lock(&self.brain)
    }
}

/// What an agent's behaviour needs to resolve the consequences of its move.
pub(crate) struct Interaction<'a> {
    pub grid: &'a Grid,
    pub agent: &'a Agent,
    pub action: Direction,
    /// Vitals at the start of the tick.
    pub before: &'a [f64],
    pub radius: usize,
}

/// Variant-specific rules plugged into the shared tick loop.
pub(crate) trait Behaviour: Send + fmt::Debug {
    /// Current internal vitals, as remembered and encoded.
    fn vitals(&self, agent: &Agent) -> Vec<f64>;

    /// Network input for a perception and vitals snapshot.
    fn encode(&self, perception: &[f64], vitals: &[f64]) -> Vec<f64>;

    /// A move imposed regardless of the policy.
    fn forced_action(&self) -> Option<Direction> {
        None
    }

    /// Apply consumption or combat after moving; returns the reward earned.
    fn resolve(&mut self, interaction: &Interaction<'_>) -> Result<f64, SimError>;

    fn is_dead(&self, agent: &Agent) -> bool;

    fn is_breedable(&self) -> bool;

    fn appearance(&self, alive: bool) -> Appearance;

    fn learning(&self) -> LearningStrategy;
}

fn behaviour_for(kind: AgentKind, config: &WorldConfig) -> (Box<dyn Behaviour>, usize, i64) {
    match kind {
        AgentKind::Survivor => (
            Box::new(Survivor::new(config.survivor.clone())),
            config.survivor.hidden_size,
            0,
        ),
        AgentKind::Fighter { team } => (
            Box::new(Fighter::new(team, config.fighter.clone())),
            config.fighter.hidden_size,
            config.fighter.starting_health,
        ),
    }
}

/// The parts of a not-yet-placed agent that end up in its shared [`Agent`] handle.
pub(crate) struct Body {
    kind: AgentKind,
    network: PolicyNetwork,
    health: i64,
    report: AgentReport,
}

impl Body {
    pub(crate) fn into_agent(self, id: AgentId) -> Agent {
        Agent::new(id, self.kind, self.network, self.health, self.report)
    }
}

/// A new agent before it has been given a cell.
pub(crate) struct Conception {
    body: Body,
    behaviour: Box<dyn Behaviour>,
    facing: Direction,
    exploration_rate: f64,
    rng: SmallRng,
}

impl Conception {
    /// Prepare an agent of `kind`, inheriting `network` when given or drawing a fresh one.
    pub(crate) fn new<R: Rng + ?Sized>(
        kind: AgentKind,
        network: Option<PolicyNetwork>,
        exploration_rate: f64,
        config: &WorldConfig,
        rng: &mut R,
    ) -> Self {
        let (behaviour, hidden, health) = behaviour_for(kind, config);
        let network = network.unwrap_or_else(|| {
            PolicyNetwork::new(
                POLICY_INPUTS,
                hidden,
                Direction::COUNT,
                config.agent.learning_rate,
                &mut *rng,
            )
        });
        let facing = Direction::random_heading(rng);
        let report = AgentReport {
            facing,
            fitness: 0.0,
            breedable: behaviour.is_breedable(),
            appearance: behaviour.appearance(true),
            ticks: 0,
            exploration_rate,
        };
        Self {
            body: Body {
                kind,
                network,
                health,
                report,
            },
            behaviour,
            facing,
            exploration_rate,
            rng: SmallRng::seed_from_u64(rng.random()),
        }
    }

    /// Hand the body to `settle`, which places it on the grid, and wrap the placed agent in
    /// its [`Life`]. `Ok(None)` when no cell was available.
    pub(crate) fn settle<F>(self, config: &WorldConfig, settle: F) -> Result<Option<Life>, SimError>
    where
        F: FnOnce(Body) -> Result<Option<Arc<Agent>>, SimError>,
    {
        let Self {
            body,
            behaviour,
            facing,
            exploration_rate,
            rng,
        } = self;
        let Some(agent) = settle(body)? else {
            return Ok(None);
        };
        Ok(Some(Life::new(agent, behaviour, facing, exploration_rate, rng, config)))
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Alive,
    Died,
}

/// Worker-owned state of a running agent.
#[derive(Debug)]
pub(crate) struct Life {
    agent: Arc<Agent>,
    behaviour: Box<dyn Behaviour>,
    memory: Memory,
    settings: AgentConfig,
    radius: usize,
    exploration_rate: f64,
    ticks: u64,
    facing: Direction,
    fitness: f64,
    rng: SmallRng,
}

impl Life {
    fn new(
        agent: Arc<Agent>,
        behaviour: Box<dyn Behaviour>,
        facing: Direction,
        exploration_rate: f64,
        rng: SmallRng,
        config: &WorldConfig,
    ) -> Self {
        Self {
            agent,
            behaviour,
            memory: Memory::new(config.agent.memory_capacity),
            settings: config.agent.clone(),
            radius: config.interaction_radius,
            exploration_rate,
            ticks: 0,
            facing,
            fitness: 0.0,
            rng,
        }
    }

    pub(crate) fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// Perceive, then either learn (every `meditation_cadence` ticks) or act, decay
    /// exploration on its own cadence, and report whether the agent survived. Death is only
    /// checked on ticks that acted.
    pub(crate) fn tick(&mut self, grid: &Grid) -> Result<TickOutcome, SimError> {
        let perception = self.perceive(grid)?;
        self.ticks += 1;
        let acted = if self.ticks % self.settings.meditation_cadence == 0 {
            self.meditate()?;
            false
        } else {
            self.act(grid, perception)?;
            true
        };
        if self.ticks % self.settings.exploration_decay_cadence == 0 {
            self.exploration_rate = (self.exploration_rate - self.settings.exploration_decay_step)
                .max(self.settings.exploration_floor);
        }

        let alive = !(acted && self.behaviour.is_dead(&self.agent));
        if !alive {
            self.agent.kill();
        }
        self.publish();
        Ok(if alive {
            TickOutcome::Alive
        } else {
            TickOutcome::Died
        })
    }

    fn perceive(&self, grid: &Grid) -> Result<Vec<f64>, SimError> {
        Ok(grid
            .perceive(self.agent.id(), self.facing)?
            .iter()
            .map(|occupant| occupant.code().value())
            .collect())
    }

    fn act(&mut self, grid: &Grid, perception: Vec<f64>) -> Result<(), SimError> {
        let vitals = self.behaviour.vitals(&self.agent);
        let action = match self.behaviour.forced_action() {
            Some(forced) => forced,
            None => {
                let input = self.behaviour.encode(&perception, &vitals);
                self.choose(&input)?
            }
        };

        let (dx, dy) = action.delta();
        grid.move_agent(self.agent.id(), dx, dy)?;
        if action != Direction::StayStill {
            self.facing = action;
        }
        let next_perception = self.perceive(grid)?;

        let reward = self.behaviour.resolve(&Interaction {
            grid,
            agent: &self.agent,
            action,
            before: &vitals,
            radius: self.radius,
        })?;
        let next_vitals = self.behaviour.vitals(&self.agent);
        self.fitness += reward;
        self.memory.remember(Experience {
            perception,
            vitals,
            action,
            reward,
            next_perception,
            next_vitals,
        });
        Ok(())
    }

    /// Explore with probability `exploration_rate`, otherwise take the best-scoring
    /// direction.
    fn choose(&mut self, input: &[f64]) -> Result<Direction, SimError> {
        if self.rng.random::<f64>() < self.exploration_rate {
            return Ok(Direction::random(&mut self.rng));
        }
        let scores = self.agent.brain().predict(input)?;
        Ok(best_direction(&scores))
    }

    fn meditate(&mut self) -> Result<(), SimError> {
        if self.memory.is_empty() {
            return Ok(());
        }
        let size = self.memory.len();
        let mut inputs = Vec::with_capacity(size);
        let mut rewards = Vec::with_capacity(size);
        let mut next_states = Vec::with_capacity(size);
        let mut actions = Vec::with_capacity(size);
        for experience in self.memory.iter() {
            inputs.push(self.behaviour.encode(&experience.perception, &experience.vitals));
            rewards.push(experience.reward);
            next_states.push(
                self.behaviour
                    .encode(&experience.next_perception, &experience.next_vitals),
            );
            actions.push(experience.action.index());
        }
        let data = TrainingData::experience(inputs, rewards, next_states, actions)?
            .with_strategy(self.behaviour.learning());
        self.agent
            .brain()
            .fit(&data, self.settings.learning_epochs, &mut self.rng)?;
        debug!(agent = ?self.agent.id(), experiences = size, ticks = self.ticks, "meditated");
        Ok(())
    }

    fn publish(&self) {
        let alive = self.agent.is_alive();
        self.agent.publish(AgentReport {
            facing: self.facing,
            fitness: self.fitness,
            breedable: alive && self.behaviour.is_breedable(),
            appearance: self.behaviour.appearance(alive),
            ticks: self.ticks,
            exploration_rate: self.exploration_rate,
        });
    }

    #[cfg(test)]
    pub(crate) fn memory(&self) -> &Memory {
        &self.memory
    }

    #[cfg(test)]
    pub(crate) fn facing(&self) -> Direction {
        self.facing
    }

    #[cfg(test)]
    pub(crate) fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }
}

/// Index of the highest score; ties go to the earliest.
fn best_direction(scores: &[f64]) -> Direction {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (index, &score) in scores.iter().enumerate() {
        if score > best_score {
            best = index;
            best_score = score;
        }
    }
    Direction::from_index(best).unwrap_or(Direction::StayStill)
}
