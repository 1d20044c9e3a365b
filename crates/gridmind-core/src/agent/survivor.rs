use std::sync::Arc;

use gridmind_brain::LearningStrategy;

use super::{Agent, Appearance, Behaviour, Interaction};
use crate::config::SurvivorConfig;
use crate::direction::Direction;
use crate::occupant::{Occupant, Resource, ResourceKind};
use crate::SimError;

const HUNGER: usize = 0;
const THIRST: usize = 1;
const ISOLATION: usize = 2;
const ENERGY: usize = 3;

const ALIVE: [u8; 3] = [255, 255, 255];
const DEAD: [u8; 3] = [0, 0, 0];
const NEED_COLORS: [[u8; 3]; 3] = [[150, 75, 0], [255, 192, 203], [255, 0, 0]];

/// Needs-driven agent: eats, drinks, seeks company and rests when exhausted.
#[derive(Debug, Clone)]
pub(crate) struct Survivor {
    needs: [f64; 3],
    energy: f64,
    config: SurvivorConfig,
}

impl Survivor {
    pub(crate) fn new(config: SurvivorConfig) -> Self {
        Self {
            needs: [0.0; 3],
            energy: config.starting_energy,
            config,
        }
    }

    /// Reward for relieving needs: the primary bonus when the dominant need (above its floor)
    /// went down, the secondary bonus for any other pressing need that went down.
    fn score(&self, before: &[f64; 3], after: &[f64; 3]) -> f64 {
        let primary = dominant(before).filter(|&need| before[need] > self.config.primary_concern_floor);
        (0..3)
            .filter(|&need| after[need] < before[need])
            .map(|need| {
                if Some(need) == primary {
                    self.config.primary_bonus
                } else if before[need] > self.config.secondary_concern_floor {
                    self.config.secondary_bonus
                } else {
                    0.0
                }
            })
            .sum()
    }
}

/// Index of the need strictly greater than both others.
fn dominant(needs: &[f64]) -> Option<usize> {
    (0..3).find(|&need| (0..3).all(|other| other == need || needs[need] > needs[other]))
}

/// The resource of `kind` within reach holding the most units, first seen on ties.
fn richest(neighbours: &[Occupant], kind: ResourceKind) -> Option<&Arc<Resource>> {
    neighbours
        .iter()
        .filter_map(|occupant| occupant.as_resource(kind))
        .filter(|resource| resource.units() > 0)
        .fold(None, |best: Option<&Arc<Resource>>, resource| match best {
            Some(current) if current.units() >= resource.units() => Some(current),
            _ => Some(resource),
        })
}

impl Behaviour for Survivor {
    fn vitals(&self, _agent: &Agent) -> Vec<f64> {
        vec![
            self.needs[HUNGER],
            self.needs[THIRST],
            self.needs[ISOLATION],
            self.energy,
        ]
    }

    fn encode(&self, perception: &[f64], vitals: &[f64]) -> Vec<f64> {
        let priority = dominant(&vitals[..3]).map_or(0.0, |need| (need + 1) as f64);
        let mut input = Vec::with_capacity(perception.len() + 2);
        input.extend_from_slice(perception);
        input.push(priority);
        input.push(vitals[ENERGY]);
        input
    }

    fn forced_action(&self) -> Option<Direction> {
        (self.energy <= 0.0).then_some(Direction::StayStill)
    }

    fn resolve(&mut self, interaction: &Interaction<'_>) -> Result<f64, SimError> {
        let neighbours = interaction
            .grid
            .interactables(interaction.agent.id(), interaction.radius)?;
        let before = self.needs;
        let threshold = self.config.consumption_threshold;

        let ate = self.needs[HUNGER] > threshold
            && richest(&neighbours, ResourceKind::Food).is_some_and(|food| food.consume());
        if ate {
            self.needs[HUNGER] -= self.config.food_relief;
            self.energy += self.config.food_energy;
        } else {
            self.needs[HUNGER] += 1.0;
        }

        let drank = self.needs[THIRST] > threshold
            && richest(&neighbours, ResourceKind::Water).is_some_and(|water| water.consume());
        if drank {
            self.needs[THIRST] -= self.config.water_relief;
        } else {
            self.needs[THIRST] += 1.0;
        }

        if neighbours.iter().any(|occupant| occupant.living_agent().is_some()) {
            self.needs[ISOLATION] = (self.needs[ISOLATION] - self.config.company_relief).max(0.0);
        } else {
            self.needs[ISOLATION] += 1.0;
        }

        let reward = self.score(&before, &self.needs);

        if interaction.action == Direction::StayStill {
            self.energy += self.config.rest_energy;
        } else {
            self.energy = (self.energy - self.config.move_cost).max(0.0);
        }
        Ok(reward)
    }

    fn is_dead(&self, _agent: &Agent) -> bool {
        self.needs[HUNGER] > self.config.death_ceiling || self.needs[THIRST] > self.config.death_ceiling
    }

    fn is_breedable(&self) -> bool {
        self.needs.iter().all(|need| *need < self.config.breeding_ceiling)
    }

    fn appearance(&self, alive: bool) -> Appearance {
        if !alive {
            return Appearance::new('X', DEAD);
        }
        let glyph = if self.energy <= 0.0 { 'E' } else { 'O' };
        let color = dominant(&self.needs)
            .filter(|&need| self.needs[need] > self.config.distress_display)
            .map_or(ALIVE, |need| NEED_COLORS[need]);
        Appearance::new(glyph, color)
    }

    fn learning(&self) -> LearningStrategy {
        self.config.learning
    }
}
