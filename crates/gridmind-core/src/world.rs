//! The threaded world runtime.
//!
//! Each agent ticks on its own worker thread and a separate thread runs the population
//! controller. All of them share one [`Grid`]; a shutdown signal stops every thread between
//! ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gridmind_brain::PolicyNetwork;
use gridmind_index::{Cell, Dimensions};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::agent::{Agent, AgentKind, Conception, Life, TickOutcome};
use crate::config::{SpawnPlacement, WorldConfig};
use crate::grid::Grid;
use crate::occupant::{Occupant, OccupantCode};
use crate::population::{PopulationConfig, PopulationController};
use crate::seed::{Seeder, Seeding};
use crate::{AgentId, SimError, lock};

/// Counts of what is currently on the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub survivors: usize,
    pub fighters: usize,
    pub corpses: usize,
    pub food: usize,
    pub water: usize,
    /// Highest fitness among living agents.
    pub best_fitness: f64,
}

impl PopulationSummary {
    #[must_use]
    pub fn living(&self) -> usize {
        self.survivors + self.fighters
    }
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    At(Cell),
    Near(AgentId),
    Random,
}

/// Stop flag that sleeping threads can be woken from.
#[derive(Debug, Default)]
struct Shutdown {
    raised: AtomicBool,
    guard: Mutex<()>,
    wake: Condvar,
}

impl Shutdown {
    /// Returns `true` for the call that actually raised the flag.
    fn raise(&self) -> bool {
        let first = !self.raised.swap(true, Ordering::AcqRel);
        let _guard = lock(&self.guard);
        self.wake.notify_all();
        first
    }

    fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Sleep for up to `timeout`; returns `true` if shutdown was raised.
    fn wait(&self, timeout: Duration) -> bool {
        let guard = lock(&self.guard);
        let _ = self
            .wake
            .wait_timeout_while(guard, timeout, |_| !self.is_raised())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_raised()
    }
}

/// Lives waiting for [`World::start`], or a note that workers run immediately.
#[derive(Debug, Default)]
struct Nursery {
    started: bool,
    dormant: Vec<Life>,
}

#[derive(Debug)]
struct WorldInner {
    config: WorldConfig,
    controller: PopulationController,
    grid: Grid,
    rng: Mutex<SmallRng>,
    shutdown: Shutdown,
    nursery: Mutex<Nursery>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    population_worker: Mutex<Option<JoinHandle<()>>>,
}

/// A running (or ready to run) simulation.
#[derive(Debug)]
pub struct World {
    inner: Arc<WorldInner>,
}

impl World {
    /// Build an empty grid, let `seeder` populate it, and adopt the seeder's population
    /// parameters. No thread runs until [`World::start`].
    pub fn new(config: WorldConfig, seeder: &dyn Seeder) -> Result<Self, SimError> {
        config.validate()?;
        let population = seeder.population();
        population.validate()?;
        let dims = Dimensions::new(config.height, config.width)?;
        let mut rng = config.seeded_rng();
        let seeding_rng = SmallRng::seed_from_u64(rng.random());
        let world = Self {
            inner: Arc::new(WorldInner {
                controller: PopulationController::new(population),
                grid: Grid::new(dims),
                rng: Mutex::new(rng),
                shutdown: Shutdown::default(),
                nursery: Mutex::new(Nursery::default()),
                workers: Mutex::new(Vec::new()),
                population_worker: Mutex::new(None),
                config,
            }),
        };

        seeder.seed(&mut Seeding::new(&world, seeding_rng))?;

        let summary = world.summary();
        info!(
            seeder = seeder.name(),
            height = dims.height,
            width = dims.width,
            survivors = summary.survivors,
            fighters = summary.fighters,
            food = summary.food,
            water = summary.water,
            "world seeded"
        );
        Ok(world)
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn population_config(&self) -> PopulationConfig {
        self.inner.controller.config()
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.inner.grid
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.inner.grid.dimensions()
    }

    /// Place a new agent of `kind` at `cell` with a fresh network. `Ok(None)` if another
    /// agent already occupies the cell or it lies outside the grid.
    pub fn spawn(&self, kind: AgentKind, cell: Cell) -> Result<Option<Arc<Agent>>, SimError> {
        let exploration = self.inner.config.agent.initial_exploration_rate;
        self.inner
            .birth(kind, None, exploration, Placement::At(cell))
    }

    #[must_use]
    pub fn live_agents(&self) -> Vec<Arc<Agent>> {
        self.inner.grid.live_agents()
    }

    /// Run one reproduction cycle now and return the offspring.
    pub fn reproduce(&self) -> Result<Vec<Arc<Agent>>, SimError> {
        self.inner.reproduce()
    }

    /// Start one worker per agent plus the population controller. Calling it again is a
    /// no-op.
    pub fn start(&self) -> Result<(), SimError> {
        let mut nursery = lock(&self.inner.nursery);
        if nursery.started {
            return Ok(());
        }
        nursery.started = true;
        let lives = std::mem::take(&mut nursery.dormant);
        let agents = lives.len();
        for life in lives {
            self.inner.spawn_worker(life)?;
        }
        drop(nursery);

        let world = Arc::clone(&self.inner);
        let handle = thread::Builder::new()
            .name("gridmind-population".into())
            .spawn(move || world.run_population())
            .map_err(SimError::Worker)?;
        *lock(&self.inner.population_worker) = Some(handle);
        info!(agents, "world started");
        Ok(())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.inner.nursery).started && !self.inner.shutdown.is_raised()
    }

    /// Signal every thread to stop and wait for them to finish.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.raise() {
            return;
        }
        if let Some(handle) = lock(&self.inner.population_worker).take()
            && handle.join().is_err()
        {
            warn!("population worker panicked");
        }
        loop {
            let handles = std::mem::take(&mut *lock(&self.inner.workers));
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if handle.join().is_err() {
                    warn!("agent worker panicked");
                }
            }
        }
        let summary = self.summary();
        info!(
            survivors = summary.survivors,
            fighters = summary.fighters,
            best_fitness = summary.best_fitness,
            "world stopped"
        );
    }

    #[must_use]
    pub fn summary(&self) -> PopulationSummary {
        let state = self.inner.grid.read();
        let mut summary = PopulationSummary::default();
        for (_, occupant) in state.cells() {
            match occupant.code() {
                OccupantCode::Empty => {}
                OccupantCode::Food => summary.food += 1,
                OccupantCode::Water => summary.water += 1,
                OccupantCode::Survivor => summary.survivors += 1,
                OccupantCode::Fighter => summary.fighters += 1,
                OccupantCode::Corpse => summary.corpses += 1,
            }
            if let Occupant::Agent(agent) = occupant
                && agent.is_alive()
            {
                summary.best_fitness = summary.best_fitness.max(agent.fitness());
            }
        }
        summary
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl WorldInner {
    fn birth(
        self: &Arc<Self>,
        kind: AgentKind,
        network: Option<PolicyNetwork>,
        exploration_rate: f64,
        placement: Placement,
    ) -> Result<Option<Arc<Agent>>, SimError> {
        let conception = {
            let mut rng = lock(&self.rng);
            Conception::new(kind, network, exploration_rate, &self.config, &mut *rng)
        };
        let life = conception.settle(&self.config, |body| {
            let make = |id| body.into_agent(id);
            Ok(match placement {
                Placement::At(cell) => self.grid.place_agent(cell, make),
                Placement::Near(parent) => self.grid.spawn_near(parent, make)?,
                Placement::Random => {
                    let mut rng = lock(&self.rng);
                    self.grid.spawn_random(&mut *rng, make)
                }
            })
        })?;
        let Some(life) = life else {
            return Ok(None);
        };
        let agent = Arc::clone(life.agent());
        self.adopt(life)?;
        Ok(Some(agent))
    }

    fn adopt(self: &Arc<Self>, life: Life) -> Result<(), SimError> {
        let mut nursery = lock(&self.nursery);
        if nursery.started {
            self.spawn_worker(life)
        } else {
            nursery.dormant.push(life);
            Ok(())
        }
    }

    fn spawn_worker(self: &Arc<Self>, life: Life) -> Result<(), SimError> {
        let name = format!("gridmind-{:?}", life.agent().id());
        let world = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || world.run_life(life))
            .map_err(SimError::Worker)?;
        let mut workers = lock(&self.workers);
        workers.retain(|handle| !handle.is_finished());
        workers.push(handle);
        Ok(())
    }

    fn run_life(&self, mut life: Life) {
        let id = life.agent().id();
        let pause = Duration::from_millis(self.config.tick_pause_ms);
        while !self.shutdown.is_raised() {
            match life.tick(&self.grid) {
                Ok(TickOutcome::Alive) => {}
                Ok(TickOutcome::Died) => {
                    debug!(agent = ?id, fitness = life.agent().fitness(), "agent died");
                    break;
                }
                Err(err) => {
                    error!(agent = ?id, error = %err, "agent worker failed");
                    life.agent().kill();
                    break;
                }
            }
            if self.shutdown.wait(pause) {
                break;
            }
        }
        if !life.agent().is_alive() {
            self.grid.cleanup(id);
        }
    }

    fn run_population(self: &Arc<Self>) {
        let interval = Duration::from_millis(self.controller.config().interval_ms);
        while !self.shutdown.wait(interval) {
            match self.reproduce() {
                Ok(children) => info!(
                    spawned = children.len(),
                    population = self.grid.read().population(),
                    "reproduction cycle"
                ),
                Err(err) => error!(error = %err, "reproduction cycle failed"),
            }
        }
    }

    fn reproduce(self: &Arc<Self>) -> Result<Vec<Arc<Agent>>, SimError> {
        let parents = self.controller.select_parents(&self.grid.live_agents());
        let mut children = Vec::with_capacity(parents.len());
        for parent in parents {
            let placement = match self.config.spawn_placement {
                SpawnPlacement::Near => Placement::Near(parent.id()),
                SpawnPlacement::Random => Placement::Random,
            };
            let exploration = self.config.agent.child_exploration_rate;
            match self.birth(parent.kind(), Some(parent.network()), exploration, placement) {
                Ok(Some(child)) => {
                    debug!(parent = ?parent.id(), child = ?child.id(), "offspring spawned");
                    children.push(child);
                }
                Ok(None) => debug!(parent = ?parent.id(), "no free cell for offspring"),
                Err(SimError::Index(err)) => {
                    debug!(parent = ?parent.id(), error = %err, "parent left the grid before breeding");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(children)
    }
}
