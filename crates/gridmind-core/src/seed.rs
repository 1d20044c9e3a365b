//! Initial world layouts.

use std::sync::Arc;

use gridmind_index::{Cell, Dimensions};
use rand::Rng;
use rand::rngs::SmallRng;

use crate::agent::{Agent, AgentKind};
use crate::occupant::ResourceKind;
use crate::population::PopulationConfig;
use crate::world::World;
use crate::SimError;

/// Fills an empty world with its initial occupants and sets the population parameters.
pub trait Seeder: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn seed(&self, seeding: &mut Seeding<'_>) -> Result<(), SimError>;

    fn population(&self) -> PopulationConfig {
        PopulationConfig::default()
    }
}

/// Placement surface handed to a [`Seeder`].
pub struct Seeding<'a> {
    world: &'a World,
    rng: SmallRng,
}

impl<'a> Seeding<'a> {
    pub(crate) fn new(world: &'a World, rng: SmallRng) -> Self {
        Self { world, rng }
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.world.dimensions()
    }

    /// Every cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let dims = self.dimensions();
        (0..dims.area()).map(move |offset| dims.cell_at(offset))
    }

    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Uniform draw from `[0, 1)`.
    pub fn roll(&mut self) -> f64 {
        self.rng.random()
    }

    /// Place fresh food; refused on cells holding an agent.
    pub fn place_food(&mut self, cell: Cell) -> bool {
        self.world.grid().place_resource(cell, ResourceKind::Food)
    }

    /// Place fresh water; refused on cells holding an agent.
    pub fn place_water(&mut self, cell: Cell) -> bool {
        self.world.grid().place_resource(cell, ResourceKind::Water)
    }

    pub fn place_survivor(&mut self, cell: Cell) -> Result<Option<Arc<Agent>>, SimError> {
        self.world.spawn(AgentKind::Survivor, cell)
    }

    pub fn place_fighter(&mut self, cell: Cell, team: u8) -> Result<Option<Arc<Agent>>, SimError> {
        self.world.spawn(AgentKind::Fighter { team }, cell)
    }

    fn place(&mut self, cell: Cell, item: Item) -> Result<(), SimError> {
        match item {
            Item::Survivor => {
                self.place_survivor(cell)?;
            }
            Item::Food => {
                self.place_food(cell);
            }
            Item::Water => {
                self.place_water(cell);
            }
        }
        Ok(())
    }

    /// Roll once per cell and place the first item whose cumulative chance covers the roll.
    fn scatter(&mut self, table: &[(f64, Item)]) -> Result<(), SimError> {
        for cell in self.cells() {
            if let Some(item) = pick(self.roll(), table) {
                self.place(cell, item)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Item {
    Survivor,
    Food,
    Water,
}

fn pick(roll: f64, table: &[(f64, Item)]) -> Option<Item> {
    let mut threshold = 0.0;
    for &(chance, item) in table {
        threshold += chance;
        if roll < threshold {
            return Some(item);
        }
    }
    None
}

/// Survivors, food and water scattered uniformly.
#[derive(Debug, Clone)]
pub struct RandomWorldSeeder {
    pub survivor_chance: f64,
    pub food_chance: f64,
    pub water_chance: f64,
    pub population: PopulationConfig,
}

impl Default for RandomWorldSeeder {
    fn default() -> Self {
        Self {
            survivor_chance: 0.015 / 4.0,
            food_chance: 0.3 / 4.0,
            water_chance: 0.3 / 4.0,
            population: PopulationConfig::default(),
        }
    }
}

impl Seeder for RandomWorldSeeder {
    fn name(&self) -> &'static str {
        "random"
    }

    fn seed(&self, seeding: &mut Seeding<'_>) -> Result<(), SimError> {
        seeding.scatter(&[
            (self.survivor_chance, Item::Survivor),
            (self.food_chance, Item::Food),
            (self.water_chance, Item::Water),
        ])
    }

    fn population(&self) -> PopulationConfig {
        self.population
    }
}

/// A vertical band of water through the middle, sparse survivors and food elsewhere.
#[derive(Debug, Clone)]
pub struct RiverSeeder {
    pub river_width: usize,
    pub survivor_chance: f64,
    pub food_chance: f64,
    pub population: PopulationConfig,
}

impl Default for RiverSeeder {
    fn default() -> Self {
        Self {
            river_width: 5,
            survivor_chance: 0.01 / 3.0,
            food_chance: 0.04 / 3.0,
            population: PopulationConfig::default(),
        }
    }
}

impl Seeder for RiverSeeder {
    fn name(&self) -> &'static str {
        "river"
    }

    fn seed(&self, seeding: &mut Seeding<'_>) -> Result<(), SimError> {
        let width = seeding.dimensions().width;
        let start = (width / 2).saturating_sub(self.river_width / 2);
        let river = start..start + self.river_width;
        let land = [
            (self.survivor_chance, Item::Survivor),
            (self.food_chance, Item::Food),
        ];
        for cell in seeding.cells() {
            if river.contains(&cell.col) {
                seeding.place_water(cell);
            } else if let Some(item) = pick(seeding.roll(), &land) {
                seeding.place(cell, item)?;
            }
        }
        Ok(())
    }

    fn population(&self) -> PopulationConfig {
        self.population
    }
}

/// Survivors and food only; water never appears.
#[derive(Debug, Clone)]
pub struct FoodOnlySeeder {
    pub survivor_chance: f64,
    pub food_chance: f64,
    pub population: PopulationConfig,
}

impl Default for FoodOnlySeeder {
    fn default() -> Self {
        Self {
            survivor_chance: 0.005 / 3.0,
            food_chance: 0.02 / 3.0,
            population: PopulationConfig::default(),
        }
    }
}

impl Seeder for FoodOnlySeeder {
    fn name(&self) -> &'static str {
        "food-only"
    }

    fn seed(&self, seeding: &mut Seeding<'_>) -> Result<(), SimError> {
        seeding.scatter(&[
            (self.survivor_chance, Item::Survivor),
            (self.food_chance, Item::Food),
        ])
    }

    fn population(&self) -> PopulationConfig {
        self.population
    }
}

/// Scattered food and water plus a single survivor on a random cell.
#[derive(Debug, Clone)]
pub struct SoloActorSeeder {
    pub food_chance: f64,
    pub water_chance: f64,
    pub population: PopulationConfig,
}

impl Default for SoloActorSeeder {
    fn default() -> Self {
        Self {
            food_chance: 0.05 / 3.0,
            water_chance: 0.03 / 3.0,
            population: PopulationConfig::default(),
        }
    }
}

impl Seeder for SoloActorSeeder {
    fn name(&self) -> &'static str {
        "solo"
    }

    fn seed(&self, seeding: &mut Seeding<'_>) -> Result<(), SimError> {
        seeding.scatter(&[
            (self.food_chance, Item::Food),
            (self.water_chance, Item::Water),
        ])?;
        let dims = seeding.dimensions();
        let offset = seeding.rng().random_range(0..dims.area());
        seeding.place_survivor(dims.cell_at(offset))?;
        Ok(())
    }

    fn population(&self) -> PopulationConfig {
        self.population
    }
}

/// Food fields on the left edge, water on the right, survivors sparse in between.
#[derive(Debug, Clone)]
pub struct FarmSeeder {
    /// Columns `0..=farm_width` hold food.
    pub farm_width: usize,
    /// The last `water_width` columns hold water.
    pub water_width: usize,
    pub survivor_chance: f64,
    pub population: PopulationConfig,
}

impl Default for FarmSeeder {
    fn default() -> Self {
        Self {
            farm_width: 10,
            water_width: 10,
            survivor_chance: 0.005,
            population: PopulationConfig::default(),
        }
    }
}

impl Seeder for FarmSeeder {
    fn name(&self) -> &'static str {
        "farm"
    }

    fn seed(&self, seeding: &mut Seeding<'_>) -> Result<(), SimError> {
        let width = seeding.dimensions().width;
        let water_start = width.saturating_sub(self.water_width);
        for cell in seeding.cells() {
            if cell.col <= self.farm_width {
                seeding.place_food(cell);
            } else if cell.col >= water_start {
                seeding.place_water(cell);
            } else if seeding.roll() < self.survivor_chance {
                seeding.place_survivor(cell)?;
            }
        }
        Ok(())
    }

    fn population(&self) -> PopulationConfig {
        self.population
    }
}

/// Fighters of two teams on an otherwise empty grid.
#[derive(Debug, Clone)]
pub struct BattleRoyaleSeeder {
    pub fighter_chance: f64,
    pub population: PopulationConfig,
}

impl Default for BattleRoyaleSeeder {
    fn default() -> Self {
        Self {
            fighter_chance: 0.007 / 2.0,
            population: PopulationConfig {
                cap: 30,
                interval_ms: 10_000,
                batch_size: 5,
            },
        }
    }
}

impl Seeder for BattleRoyaleSeeder {
    fn name(&self) -> &'static str {
        "battle-royale"
    }

    fn seed(&self, seeding: &mut Seeding<'_>) -> Result<(), SimError> {
        for cell in seeding.cells() {
            if seeding.roll() < self.fighter_chance {
                let team = if seeding.rng().random_bool(0.5) { 1 } else { 2 };
                seeding.place_fighter(cell, team)?;
            }
        }
        Ok(())
    }

    fn population(&self) -> PopulationConfig {
        self.population
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_walks_cumulative_chances() {
        let table = [(0.1, Item::Survivor), (0.2, Item::Food)];
        assert!(matches!(pick(0.05, &table), Some(Item::Survivor)));
        assert!(matches!(pick(0.25, &table), Some(Item::Food)));
        assert!(pick(0.35, &table).is_none());
    }
}
