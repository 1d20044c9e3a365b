use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use gridmind_app::{SeederChoice, load_config, render_frame};
use gridmind_core::{PopulationSummary, World};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "gridmind",
    version,
    about = "Run a grid world of agents that learn to survive"
)]
struct Cli {
    /// JSON file holding a world configuration; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial layout of resources and agents.
    #[arg(long, value_enum, default_value_t = SeederChoice::Random)]
    seeder: SeederChoice,

    /// Number of rows, overriding the configuration.
    #[arg(long)]
    height: Option<usize>,

    /// Number of columns, overriding the configuration.
    #[arg(long)]
    width: Option<usize>,

    /// Seed for a reproducible initial layout.
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds to run before shutting down.
    #[arg(long, default_value_t = 60)]
    run_secs: u64,

    /// Milliseconds between population summaries.
    #[arg(long, default_value_t = 1000)]
    summary_interval_ms: u64,

    /// Print a text frame of the grid with every summary.
    #[arg(long)]
    render: bool,

    /// Disable colour in rendered frames.
    #[arg(long)]
    no_color: bool,

    /// Print the final population summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(width) = cli.width {
        config.width = width;
    }
    if cli.seed.is_some() {
        config.rng_seed = cli.seed;
    }

    let seeder = cli.seeder.seeder();
    let world = World::new(config, seeder.as_ref()).context("failed to seed world")?;
    world.start().context("failed to start agents")?;
    info!(seeder = ?cli.seeder, run_secs = cli.run_secs, "Starting gridmind simulation");

    let summary = run(&world, &cli);
    world.shutdown();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn run(world: &World, cli: &Cli) -> PopulationSummary {
    let deadline = Instant::now() + Duration::from_secs(cli.run_secs);
    let interval = Duration::from_millis(cli.summary_interval_ms.max(1));
    let mut summary = world.summary();

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(interval.min(deadline - now));

        summary = world.summary();
        info!(
            survivors = summary.survivors,
            fighters = summary.fighters,
            corpses = summary.corpses,
            food = summary.food,
            water = summary.water,
            best_fitness = summary.best_fitness,
            "population"
        );
        if cli.render {
            println!("{}", render_frame(world, !cli.no_color));
        }
        if summary.living() == 0 {
            warn!("population died out");
            break;
        }
    }

    summary
}
