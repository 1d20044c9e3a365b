//! The shared toroidal grid: occupant cells plus the agent location index.
//!
//! Both live inside one [`GridState`] behind a single `RwLock`, so every mutation moves a
//! cell and its index entry together and readers never observe one without the other.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gridmind_index::{Cell, Dimensions, IndexError, LocationIndex, NeighborhoodIndex};
use rand::Rng;

use crate::AgentId;
use crate::agent::Agent;
use crate::direction::Direction;
use crate::occupant::{Occupant, Resource, ResourceKind};

/// Random probes tried by [`Grid::spawn_random`] before falling back to a scan.
const RANDOM_SPAWN_PROBES: usize = 32;

/// Cells and agent locations, always mutated together.
#[derive(Debug)]
pub struct GridState {
    dims: Dimensions,
    cells: Vec<Occupant>,
    locations: LocationIndex<AgentId>,
}

impl GridState {
    fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            cells: vec![Occupant::Empty; dims.area()],
            locations: LocationIndex::new(),
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Occupant of `cell`, or `None` outside the grid.
    #[must_use]
    pub fn occupant_at(&self, cell: Cell) -> Option<&Occupant> {
        self.dims
            .contains(cell)
            .then(|| &self.cells[self.dims.offset_of(cell)])
    }

    pub fn location_of(&self, id: AgentId) -> Result<Cell, IndexError> {
        self.locations.get(id)
    }

    /// Number of agents with a recorded location, dead ones awaiting cleanup included.
    #[must_use]
    pub fn population(&self) -> usize {
        self.locations.len()
    }

    /// Every cell with its occupant, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, &Occupant)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(offset, occupant)| (self.dims.cell_at(offset), occupant))
    }

    /// Every agent on the grid, alive or not.
    pub fn agents(&self) -> impl Iterator<Item = &Arc<Agent>> + '_ {
        self.locations
            .iter()
            .filter_map(|(_, cell)| self.cells[self.dims.offset_of(cell)].as_agent())
    }

    /// First non-empty occupant along each sight line of `facing`, or `Empty` for lines that
    /// see nothing. Sight lines clamp at the grid edges and never report the viewer itself.
    pub fn perceive(&self, id: AgentId, facing: Direction) -> Result<Vec<Occupant>, IndexError> {
        let origin = self.location_of(id)?;
        let seen = facing
            .field_of_vision()
            .iter()
            .map(|line| {
                line.iter()
                    .map(|&(dx, dy)| self.dims.clamped(origin, dx, dy))
                    .filter(|cell| *cell != origin)
                    .map(|cell| &self.cells[self.dims.offset_of(cell)])
                    .find(|occupant| !occupant.is_empty())
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        Ok(seen)
    }

    /// Non-empty occupants within Chebyshev `radius` of the agent, wrapping around edges.
    pub fn interactables(&self, id: AgentId, radius: usize) -> Result<Vec<Occupant>, IndexError> {
        let origin = self.location_of(id)?;
        Ok(self.interactables_at(origin, radius))
    }

    /// Non-empty occupants within Chebyshev `radius` of `center`, excluding `center`.
    #[must_use]
    pub fn interactables_at(&self, center: Cell, radius: usize) -> Vec<Occupant> {
        let mut found = Vec::new();
        self.dims.neighbors_within(center, radius, &mut |cell| {
            let occupant = &self.cells[self.dims.offset_of(cell)];
            if !occupant.is_empty() {
                found.push(occupant.clone());
            }
        });
        found
    }

    fn holds_agent(&self, cell: Cell) -> bool {
        self.cells[self.dims.offset_of(cell)].as_agent().is_some()
    }

    fn insert_agent(
        &mut self,
        cell: Cell,
        make: impl FnOnce(AgentId) -> Agent,
    ) -> Option<Arc<Agent>> {
        if !self.dims.contains(cell) || self.holds_agent(cell) {
            return None;
        }
        let id = self.locations.insert(cell);
        let agent = Arc::new(make(id));
        self.cells[self.dims.offset_of(cell)] = Occupant::Agent(Arc::clone(&agent));
        Some(agent)
    }

    fn place_resource(&mut self, cell: Cell, kind: ResourceKind) -> bool {
        if !self.dims.contains(cell) || self.holds_agent(cell) {
            return false;
        }
        let offset = self.dims.offset_of(cell);
        self.cells[offset] = Occupant::Resource(Arc::new(Resource::new(kind)));
        true
    }

    fn move_agent(&mut self, id: AgentId, dx: i64, dy: i64) -> Result<Cell, IndexError> {
        let from = self.location_of(id)?;
        let to = self.dims.wrapped(from, dx, dy);
        if to == from {
            return Ok(from);
        }
        let (from_offset, to_offset) = (self.dims.offset_of(from), self.dims.offset_of(to));
        if self.cells[to_offset].living_agent().is_some() {
            return Ok(from);
        }

        let mover = std::mem::take(&mut self.cells[from_offset]);
        match std::mem::replace(&mut self.cells[to_offset], mover) {
            Occupant::Agent(corpse) => {
                // Corpses leave the index together with their cell.
                let removed = self.locations.remove(corpse.id());
                debug_assert!(removed.is_ok(), "corpse on the grid was not indexed");
            }
            displaced => self.cells[from_offset] = displaced,
        }
        self.locations.set(id, to)?;
        Ok(to)
    }

    fn remove_agent(&mut self, id: AgentId) -> bool {
        let Ok(cell) = self.locations.remove(id) else {
            return false;
        };
        let offset = self.dims.offset_of(cell);
        if self.cells[offset]
            .as_agent()
            .is_some_and(|agent| agent.id() == id)
        {
            self.cells[offset] = Occupant::Empty;
        }
        true
    }

    /// The cell diagonally below-right of `origin`, else the first neighbour not holding an
    /// agent.
    fn free_cell_near(&self, origin: Cell) -> Option<Cell> {
        let preferred = self.dims.wrapped(origin, 1, 1);
        if preferred != origin && !self.holds_agent(preferred) {
            return Some(preferred);
        }
        let mut free = None;
        self.dims.neighbors_within(origin, 1, &mut |cell| {
            if free.is_none() && !self.holds_agent(cell) {
                free = Some(cell);
            }
        });
        free
    }
}

/// Thread-safe handle to the grid.
#[derive(Debug)]
pub struct Grid {
    state: RwLock<GridState>,
}

impl Grid {
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        Self {
            state: RwLock::new(GridState::new(dims)),
        }
    }

    /// Shared view for several queries against one consistent snapshot.
    pub fn read(&self) -> RwLockReadGuard<'_, GridState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GridState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.read().dimensions()
    }

    /// Clone of the occupant at `cell`; `Empty` outside the grid.
    #[must_use]
    pub fn occupant_at(&self, cell: Cell) -> Occupant {
        self.read().occupant_at(cell).cloned().unwrap_or_default()
    }

    pub fn location_of(&self, id: AgentId) -> Result<Cell, IndexError> {
        self.read().location_of(id)
    }

    pub fn perceive(&self, id: AgentId, facing: Direction) -> Result<Vec<Occupant>, IndexError> {
        self.read().perceive(id, facing)
    }

    pub fn interactables(&self, id: AgentId, radius: usize) -> Result<Vec<Occupant>, IndexError> {
        self.read().interactables(id, radius)
    }

    /// Move an agent by `dx` columns and `dy` rows with wraparound and return where it ends
    /// up.
    ///
    /// A resource at the destination swaps into the vacated cell. A corpse at the destination
    /// is removed from the grid and the vacated cell becomes empty. A living agent at the
    /// destination blocks the move.
    pub fn move_agent(&self, id: AgentId, dx: i64, dy: i64) -> Result<Cell, IndexError> {
        self.write().move_agent(id, dx, dy)
    }

    /// Remove an agent from both the cells and the location index. Returns `false` if it had
    /// already been removed; a cell that no longer holds the agent is left untouched.
    pub fn cleanup(&self, id: AgentId) -> bool {
        self.write().remove_agent(id)
    }

    /// Agents that are still alive.
    #[must_use]
    pub fn live_agents(&self) -> Vec<Arc<Agent>> {
        self.read()
            .agents()
            .filter(|agent| agent.is_alive())
            .cloned()
            .collect()
    }

    pub(crate) fn place_resource(&self, cell: Cell, kind: ResourceKind) -> bool {
        self.write().place_resource(cell, kind)
    }

    pub(crate) fn place_agent(
        &self,
        cell: Cell,
        make: impl FnOnce(AgentId) -> Agent,
    ) -> Option<Arc<Agent>> {
        self.write().insert_agent(cell, make)
    }

    /// Place a new agent next to `parent`. `None` when every neighbouring cell holds an agent.
    pub(crate) fn spawn_near(
        &self,
        parent: AgentId,
        make: impl FnOnce(AgentId) -> Agent,
    ) -> Result<Option<Arc<Agent>>, IndexError> {
        let mut state = self.write();
        let origin = state.location_of(parent)?;
        Ok(state
            .free_cell_near(origin)
            .and_then(|cell| state.insert_agent(cell, make)))
    }

    /// Place a new agent on a random empty cell, or on the first cell without an agent when
    /// no empty cell is left. `None` when every cell holds an agent.
    pub(crate) fn spawn_random<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        make: impl FnOnce(AgentId) -> Agent,
    ) -> Option<Arc<Agent>> {
        let mut state = self.write();
        let dims = state.dimensions();
        let is_empty = |cell: &Cell| state.cells[dims.offset_of(*cell)].is_empty();
        let cell = (0..RANDOM_SPAWN_PROBES)
            .map(|_| dims.cell_at(rng.random_range(0..dims.area())))
            .find(is_empty)
            .or_else(|| (0..dims.area()).map(|offset| dims.cell_at(offset)).find(is_empty))
            .or_else(|| {
                (0..dims.area())
                    .map(|offset| dims.cell_at(offset))
                    .find(|cell| !state.holds_agent(*cell))
            })?;
        state.insert_agent(cell, make)
    }
}

#[cfg(test)]
mod tests {
    use gridmind_brain::PolicyNetwork;
    use rand::{SeedableRng, rngs::SmallRng};

    use super::*;
    use crate::agent::{AgentKind, AgentReport, Appearance};

    fn make(id: AgentId) -> Agent {
        let mut rng = SmallRng::seed_from_u64(3);
        let report = AgentReport {
            facing: Direction::Up,
            fitness: 0.0,
            breedable: true,
            appearance: Appearance::new('O', [255; 3]),
            ticks: 0,
            exploration_rate: 0.5,
        };
        let network = PolicyNetwork::new(2, 2, Direction::COUNT, 0.1, &mut rng);
        Agent::new(id, AgentKind::Survivor, network, 0, report)
    }

    fn grid(height: usize, width: usize) -> Grid {
        Grid::new(Dimensions::new(height, width).expect("dims"))
    }

    #[test]
    fn moving_onto_a_corpse_removes_it() {
        let grid = grid(4, 4);
        let mover = grid.place_agent(Cell::new(1, 1), make).expect("placed");
        let corpse = grid.place_agent(Cell::new(1, 2), make).expect("placed");
        corpse.kill();

        assert_eq!(grid.move_agent(mover.id(), 1, 0), Ok(Cell::new(1, 2)));
        assert!(grid.occupant_at(Cell::new(1, 1)).is_empty());
        assert!(matches!(
            grid.location_of(corpse.id()),
            Err(IndexError::MissingLocation { .. })
        ));
        assert_eq!(grid.read().population(), 1);
        assert!(!grid.cleanup(corpse.id()));
    }

    #[test]
    fn random_spawns_prefer_empty_cells() {
        let grid = grid(3, 3);
        for row in 0..3 {
            for col in 0..2 {
                assert!(grid.place_resource(Cell::new(row, col), ResourceKind::Water));
            }
        }
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..3 {
            let agent = grid.spawn_random(&mut rng, make).expect("room left");
            assert_eq!(grid.location_of(agent.id()).map(|cell| cell.col), Ok(2));
        }
        // Only resource cells remain, so the next spawn replaces one.
        let agent = grid.spawn_random(&mut rng, make).expect("resource cell");
        assert_eq!(grid.location_of(agent.id()), Ok(Cell::new(0, 0)));
    }

    #[test]
    fn random_spawn_on_a_full_grid_gives_none() {
        let grid = grid(2, 2);
        let mut rng = SmallRng::seed_from_u64(6);
        for _ in 0..4 {
            assert!(grid.spawn_random(&mut rng, make).is_some());
        }
        assert!(grid.spawn_random(&mut rng, make).is_none());
        assert_eq!(grid.read().population(), 4);
    }
}
