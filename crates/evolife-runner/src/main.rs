//! Headless runner: loads a symbolic map, runs the ecosystem and prints the
//! final world.

mod telemetry;

use anyhow::{Context, Result};
use evolife_core::{EntityId, RunnerConfig, Species};
use evolife_world::{parse_map, render, Simulation};
use std::fs;
use tracing::{debug, info};

const BUNDLED_MAP: &str = include_str!("../maps/coast.txt");

fn main() -> Result<()> {
    let json_logs = std::env::var("EVOLIFE_LOG_JSON").is_ok_and(|value| value == "1");
    telemetry::init_telemetry(json_logs)?;

    let config = load_config(std::env::args().nth(1).as_deref())?;
    info!(
        seed = config.seed,
        num_ticks = config.num_ticks,
        report_interval = config.report_interval,
        "Starting Evolife runner"
    );

    let text = match &config.map_path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read map {}", path))?,
        None => BUNDLED_MAP.to_string(),
    };
    let entity_map = parse_map(&text, &config.ecosystem);
    let mut sim = Simulation::new(entity_map, config.ecosystem.clone(), config.seed)
        .context("failed to build the world")?
        .with_report_interval(config.report_interval);

    // Follow one animal through the run, the way the inspector panel does
    let watched = sim
        .list(Species::Herbivore)
        .first()
        .or_else(|| sim.list(Species::Carnivore).first())
        .copied();
    if let Some(id) = watched {
        debug!(entity = %id, "Watching entity");
    }

    let summary = sim.run(config.num_ticks);
    report_watched(&sim, watched)?;

    println!("{}", render(&sim.snapshot(), sim.tick() as usize, sim.config()));
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<RunnerConfig> {
    match path {
        Some(path) => {
            RunnerConfig::load(path).with_context(|| format!("failed to load config {}", path))
        }
        None => Ok(RunnerConfig::default()),
    }
}

fn report_watched(sim: &Simulation, watched: Option<EntityId>) -> Result<()> {
    let Some(id) = watched else {
        return Ok(());
    };
    match sim.entity(id) {
        Some(entity) => {
            let stats = serde_json::to_string(&entity.stats())?;
            info!(
                entity = %id,
                position = ?sim.position_of(id),
                stats = %stats,
                "Watched entity still alive"
            );
        }
        None => info!(entity = %id, "Watched entity left the simulation"),
    }
    Ok(())
}
