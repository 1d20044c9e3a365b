use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use gridmind_app::{SeederChoice, load_config, render_frame};
use gridmind_core::{AgentKind, Cell, Seeder, Seeding, SimError, World, WorldConfig};

struct Fixture;

impl Seeder for Fixture {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn seed(&self, seeding: &mut Seeding<'_>) -> Result<(), SimError> {
        seeding.place_food(Cell::new(0, 1));
        seeding.place_water(Cell::new(1, 2));
        seeding.place_survivor(Cell::new(2, 3))?;
        seeding.place_fighter(Cell::new(3, 0), 1)?;
        Ok(())
    }
}

struct Bare;

impl Seeder for Bare {
    fn name(&self) -> &'static str {
        "bare"
    }

    fn seed(&self, _seeding: &mut Seeding<'_>) -> Result<(), SimError> {
        Ok(())
    }
}

fn world(height: usize, width: usize, seeder: &dyn Seeder) -> Result<World> {
    let mut config = WorldConfig::with_dimensions(height, width);
    config.rng_seed = Some(7);
    config.survivor.hidden_size = 4;
    config.fighter.hidden_size = 4;
    Ok(World::new(config, seeder)?)
}

#[test]
fn plain_frame_draws_one_glyph_per_cell() -> Result<()> {
    let world = world(4, 5, &Fixture)?;
    let frame = render_frame(&world, false);
    let rows: Vec<&str> = frame.lines().collect();
    assert_eq!(rows, vec![".f...", "..~..", "...O.", "F...."]);
    Ok(())
}

#[test]
fn coloured_frame_uses_truecolor_escapes() -> Result<()> {
    let world = world(4, 5, &Fixture)?;
    let frame = render_frame(&world, true);
    assert!(frame.contains("\u{1b}[38;2;"));
    assert_eq!(frame.lines().count(), 4);
    Ok(())
}

#[test]
fn cleaned_up_agents_leave_empty_cells() -> Result<()> {
    let world = world(3, 3, &Bare)?;
    let agent = world
        .spawn(AgentKind::Survivor, Cell::new(1, 1))?
        .expect("cell is free");
    assert_eq!(render_frame(&world, false).lines().nth(1), Some(".O."));
    assert!(world.grid().cleanup(agent.id()));
    assert_eq!(render_frame(&world, false).lines().nth(1), Some("..."));
    Ok(())
}

#[test]
fn every_seeder_choice_builds_a_world() -> Result<()> {
    for &choice in SeederChoice::value_variants() {
        let seeder = choice.seeder();
        let world = world(60, 60, seeder.as_ref())?;
        let summary = world.summary();
        assert!(
            summary.food + summary.water + summary.living() > 0,
            "{choice:?} left the grid empty"
        );
        assert_eq!(summary.corpses, 0);
    }
    Ok(())
}

#[test]
fn seeder_choice_parses_kebab_case() {
    assert_eq!(
        SeederChoice::from_str("battle-royale", true),
        Ok(SeederChoice::BattleRoyale)
    );
    assert_eq!(
        SeederChoice::from_str("food-only", false),
        Ok(SeederChoice::FoodOnly)
    );
    assert!(SeederChoice::from_str("volcano", false).is_err());
}

#[test]
fn partial_config_file_keeps_defaults() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{ "width": 12, "height": 9, "survivor": {{ "starting_energy": 50.0 }} }}"#
    )?;
    let config = load_config(Some(file.path()))?;
    assert_eq!((config.height, config.width), (9, 12));
    assert_eq!(config.survivor.starting_energy, 50.0);
    assert_eq!(config.survivor.death_ceiling, 1000.0);
    assert_eq!(config.agent.memory_capacity, 1000);
    Ok(())
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_config(Some(&dir.path().join("absent.json"))).is_err());
    let defaults = load_config(None).expect("defaults");
    assert_eq!((defaults.height, defaults.width), (300, 75));
}
