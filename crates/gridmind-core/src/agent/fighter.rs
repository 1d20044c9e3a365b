use gridmind_brain::LearningStrategy;

use super::{Agent, AgentKind, Appearance, Behaviour, Interaction};
use crate::SimError;
use crate::config::FighterConfig;
use crate::occupant::Occupant;

const BLUE: [u8; 3] = [0, 0, 255];
const RED: [u8; 3] = [255, 0, 0];
const DEAD: [u8; 3] = [0, 0, 0];

/// Team combat agent. Health lives in the shared [`Agent`] handle because opponents
/// subtract from it.
#[derive(Debug, Clone)]
pub(crate) struct Fighter {
    team: u8,
    fights_won: u64,
    config: FighterConfig,
}

impl Fighter {
    pub(crate) fn new(team: u8, config: FighterConfig) -> Self {
        Self {
            team,
            fights_won: 0,
            config,
        }
    }
}

fn living_fighter_of(occupant: &Occupant, team: u8) -> bool {
    occupant
        .living_agent()
        .is_some_and(|agent| agent.kind() == AgentKind::Fighter { team })
}

impl Behaviour for Fighter {
    fn vitals(&self, agent: &Agent) -> Vec<f64> {
        vec![agent.health() as f64, self.fights_won as f64]
    }

    fn encode(&self, perception: &[f64], vitals: &[f64]) -> Vec<f64> {
        let mut input = Vec::with_capacity(perception.len() + vitals.len());
        input.extend_from_slice(vitals);
        input.extend_from_slice(perception);
        input
    }

    /// Attack every adjacent enemy that has fewer allies around it than this fighter has.
    fn resolve(&mut self, interaction: &Interaction<'_>) -> Result<f64, SimError> {
        let radius = interaction.radius;
        let targets = {
            let state = interaction.grid.read();
            let neighbours = state.interactables(interaction.agent.id(), radius)?;
            let allies = neighbours
                .iter()
                .filter(|occupant| living_fighter_of(occupant, self.team))
                .count();
            let mut targets = Vec::new();
            for enemy in neighbours.iter().filter_map(Occupant::living_agent) {
                let Some(enemy_team) = enemy.team().filter(|team| *team != self.team) else {
                    continue;
                };
                let enemy_cell = state.location_of(enemy.id())?;
                let enemy_allies = state
                    .interactables_at(enemy_cell, radius)
                    .iter()
                    .filter(|occupant| living_fighter_of(occupant, enemy_team))
                    .count();
                if enemy_allies < allies {
                    targets.push(std::sync::Arc::clone(enemy));
                }
            }
            targets
        };

        for target in &targets {
            target.take_hit(self.config.hit_damage);
        }
        self.fights_won += targets.len() as u64;

        let mut reward = 0.0;
        if !targets.is_empty() {
            reward += self.config.win_bonus;
        }
        let health_before = interaction.before.first().copied().unwrap_or_default();
        if interaction.agent.health() as f64 >= health_before {
            reward += self.config.unharmed_bonus;
        }
        Ok(reward)
    }

    fn is_dead(&self, agent: &Agent) -> bool {
        agent.health() <= 0
    }

    fn is_breedable(&self) -> bool {
        true
    }

    fn appearance(&self, alive: bool) -> Appearance {
        match (alive, self.team) {
            (false, _) => Appearance::new('X', DEAD),
            (true, 1) => Appearance::new('F', BLUE),
            (true, _) => Appearance::new('F', RED),
        }
    }

    fn learning(&self) -> LearningStrategy {
        self.config.learning
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gridmind_index::{Cell, Dimensions};
    use rand::{SeedableRng, rngs::SmallRng};

    use super::*;
    use crate::agent::Conception;
    use crate::config::WorldConfig;
    use crate::direction::Direction;
    use crate::grid::Grid;

    fn spawn(
        grid: &Grid,
        config: &WorldConfig,
        team: u8,
        cell: Cell,
        rng: &mut SmallRng,
    ) -> Arc<Agent> {
        let mut placed = None;
        Conception::new(AgentKind::Fighter { team }, None, 0.0, config, rng)
            .settle(config, |body| {
                placed = grid.place_agent(cell, |id| body.into_agent(id));
                Ok(placed.clone())
            })
            .expect("settle");
        placed.expect("free cell")
    }

    fn arena() -> (Grid, WorldConfig, SmallRng) {
        let mut config = WorldConfig::with_dimensions(10, 10);
        config.fighter.hidden_size = 4;
        (
            Grid::new(Dimensions::new(10, 10).expect("dims")),
            config,
            SmallRng::seed_from_u64(9),
        )
    }

    fn clash(grid: &Grid, fighter: &mut Fighter, attacker: &Agent) -> f64 {
        let before = fighter.vitals(attacker);
        fighter
            .resolve(&Interaction {
                grid,
                agent: attacker,
                action: Direction::StayStill,
                before: &before,
                radius: 1,
            })
            .expect("resolve")
    }

    #[test]
    fn outnumbering_fighter_hits_isolated_enemy() {
        let (grid, config, mut rng) = arena();
        let attacker = spawn(&grid, &config, 1, Cell::new(5, 5), &mut rng);
        spawn(&grid, &config, 1, Cell::new(4, 5), &mut rng);
        let enemy = spawn(&grid, &config, 2, Cell::new(5, 6), &mut rng);

        let mut fighter = Fighter::new(1, config.fighter.clone());
        assert_eq!(clash(&grid, &mut fighter, &attacker), 11.0);
        assert_eq!(enemy.health(), 90);
        assert_eq!(fighter.vitals(&attacker), vec![100.0, 1.0]);
    }

    #[test]
    fn even_odds_start_no_fight() {
        let (grid, config, mut rng) = arena();
        let attacker = spawn(&grid, &config, 2, Cell::new(0, 0), &mut rng);
        let enemy = spawn(&grid, &config, 1, Cell::new(9, 9), &mut rng);

        let mut fighter = Fighter::new(2, config.fighter.clone());
        assert_eq!(clash(&grid, &mut fighter, &attacker), 1.0);
        assert_eq!(enemy.health(), 100);
        assert_eq!(fighter.appearance(true), Appearance::new('F', RED));
        assert!(!fighter.is_dead(&attacker));
    }
}
