//! Shell helpers for the gridmind binary: seeder selection, configuration loading and the
//! coloured text frame.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use gridmind_core::{
    BattleRoyaleSeeder, Cell, FarmSeeder, FoodOnlySeeder, Occupant, RandomWorldSeeder,
    ResourceKind, RiverSeeder, Seeder, SoloActorSeeder, World, WorldConfig,
};
use owo_colors::OwoColorize;

const EMPTY_GLYPH: char = '.';
const FOOD_GLYPH: char = 'f';
const WATER_GLYPH: char = '~';
const FOOD_COLOR: [u8; 3] = [60, 176, 67];
const WATER_COLOR: [u8; 3] = [64, 128, 255];

/// World layouts selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SeederChoice {
    /// Survivors, food and water scattered uniformly.
    #[default]
    Random,
    /// A band of water down the middle with sparse food.
    River,
    /// Food and survivors only.
    FoodOnly,
    /// A single survivor among scattered resources.
    SoloActor,
    /// A food field on the left and water on the right.
    Farm,
    /// Two fighter teams on an empty grid.
    BattleRoyale,
}

impl SeederChoice {
    #[must_use]
    pub fn seeder(self) -> Box<dyn Seeder> {
        match self {
            Self::Random => Box::new(RandomWorldSeeder::default()),
            Self::River => Box::new(RiverSeeder::default()),
            Self::FoodOnly => Box::new(FoodOnlySeeder::default()),
            Self::SoloActor => Box::new(SoloActorSeeder::default()),
            Self::Farm => Box::new(FarmSeeder::default()),
            Self::BattleRoyale => Box::new(BattleRoyaleSeeder::default()),
        }
    }
}

/// Read a [`WorldConfig`] from a JSON file, or the defaults when no path is given. Missing
/// fields fall back to their defaults.
pub fn load_config(path: Option<&Path>) -> Result<WorldConfig> {
    let Some(path) = path else {
        return Ok(WorldConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// Display glyph and colour for one occupant.
#[must_use]
pub fn glyph(occupant: &Occupant) -> (char, Option<[u8; 3]>) {
    match occupant {
        Occupant::Empty => (EMPTY_GLYPH, None),
        Occupant::Resource(resource) => match resource.kind() {
            ResourceKind::Food => (FOOD_GLYPH, Some(FOOD_COLOR)),
            ResourceKind::Water => (WATER_GLYPH, Some(WATER_COLOR)),
        },
        Occupant::Agent(agent) => {
            let appearance = agent.appearance();
            (appearance.glyph, Some(appearance.color))
        }
    }
}

/// Render the grid as one line per row. Colour uses 24-bit escapes.
#[must_use]
pub fn render_frame(world: &World, color: bool) -> String {
    let state = world.grid().read();
    let dims = state.dimensions();
    let mut frame = String::with_capacity(dims.area() + dims.height);
    for row in 0..dims.height {
        for col in 0..dims.width {
            let Some(occupant) = state.occupant_at(Cell::new(row, col)) else {
                continue;
            };
            match glyph(occupant) {
                (ch, Some([r, g, b])) if color => {
                    let _ = write!(frame, "{}", ch.truecolor(r, g, b));
                }
                (ch, _) => frame.push(ch),
            }
        }
        frame.push('\n');
    }
    frame
}
