//! Tick scheduler: runs every species group in a fixed order and keeps the
//! live lists in step with the grid.

use crate::behavior;
use crate::entity::{Entity, Occupant};
use crate::grid::{EntityMap, Grid, Tile};
use crate::roster::Roster;
use evolife_core::{EcosystemConfig, EntityId, Error, Position, Result, Species};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Species groups in acting order. Predators act before their prey, and
/// water spawns only after the existing protozoa have moved.
const TURN_ORDER: [Species; 6] = [
    Species::Carnivore,
    Species::Herbivore,
    Species::Plant,
    Species::RainForest,
    Species::Protozoan,
    Species::Water,
];

const DEFAULT_REPORT_INTERVAL: u64 = 100;

pub struct Simulation {
    grid: Grid,
    roster: Roster,
    config: EcosystemConfig,
    rng: ChaCha8Rng,
    tick: u64,
    report_interval: u64,
    births: u64,
    deaths: u64,
    kills: u64,
}

impl Simulation {
    pub fn new(entity_map: EntityMap, config: EcosystemConfig, seed: u64) -> Result<Self> {
        Self::with_rng(entity_map, config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Build the grid from `entity_map` and index every entity on it.
    ///
    /// Fails on a malformed map or on species tables the engine cannot run.
    pub fn with_rng(entity_map: EntityMap, config: EcosystemConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        let grid = Grid::build(entity_map)?;
        let roster = Roster::index(&grid);

        debug!(
            width = grid.width,
            height = grid.height,
            entities = grid.population(),
            "World created"
        );

        Ok(Self {
            grid,
            roster,
            config,
            rng,
            tick: 0,
            report_interval: DEFAULT_REPORT_INTERVAL,
            births: 0,
            deaths: 0,
            kills: 0,
        })
    }

    /// Ticks between population reports in [`Simulation::run`]; 0 disables them.
    pub fn with_report_interval(mut self, report_interval: u64) -> Self {
        self.report_interval = report_interval;
        self
    }

    /// Run `num_ticks` updates and summarize the outcome.
    #[instrument(skip(self), fields(start_tick = self.tick))]
    pub fn run(&mut self, num_ticks: u64) -> SimulationSummary {
        info!("Starting simulation for {} ticks", num_ticks);

        for _ in 0..num_ticks {
            self.update();

            if self.report_interval > 0 && self.tick % self.report_interval == 0 {
                self.emit_population_metrics();
            }
        }

        let summary = self.summary();
        info!(
            event = "run_summary",
            final_tick = summary.tick,
            births = summary.births,
            deaths = summary.deaths,
            kills = summary.kills,
            alive = summary.population.total(),
            "Simulation finished"
        );
        summary
    }

    /// Advance the world by one tick.
    ///
    /// # Panics
    /// In debug builds, if a listed entity is no longer attached to the grid
    /// afterwards or an attached one is missing from the lists.
    pub fn update(&mut self) {
        for species in TURN_ORDER {
            self.turn(species);
        }
        self.tick += 1;

        if cfg!(debug_assertions) {
            if let Err(err) = self.verify_consistency() {
                panic!("tick {}: {}", self.tick, err);
            }
        }
    }

    /// Let every live entity of `species` act once.
    ///
    /// Survivors keep their order and newborns of the same species queue up
    /// behind them; newborns of other species (a plant seeded by a forest, a
    /// land animal out of a protozoan) join their own list right away.
    fn turn(&mut self, species: Species) {
        let acting = self.roster.take(species);
        let mut next = Vec::with_capacity(acting.len());
        let mut newborn = Vec::new();
        let mut killed = Vec::new();

        for id in acting {
            let result = behavior::act(&mut self.grid, id, &self.config, &mut self.rng);

            if result.death {
                self.deaths += 1;
            } else {
                next.push(id);
            }
            if let Some(child) = result.offspring {
                self.births += 1;
                match self.grid.entity(child).map(Occupant::species) {
                    Some(born) if born == species => newborn.push(child),
                    Some(born) => self.roster.push(born, child),
                    None => panic!("offspring {child} of {id} is not attached"),
                }
            }
            if let Some(prey) = result.killed_prey {
                self.kills += 1;
                killed.push(prey);
            }
        }

        next.extend(newborn);
        self.roster.set(species, next);

        if let Some(prey) = species.prey() {
            self.roster.remove_all(prey, &killed);
        }
    }

    /// Detach every live entity of `species` and empty its list.
    ///
    /// Only valid between ticks. Returns how many entities were removed.
    pub fn kill_all(&mut self, species: Species) -> usize {
        let culled = self.roster.take(species);
        for &id in &culled {
            if self.grid.detach(id).is_none() {
                panic!("listed {species} {id} was not attached");
            }
        }
        info!(%species, count = culled.len(), "Species culled");
        culled.len()
    }

    /// Topmost entity of every cell.
    pub fn snapshot(&self) -> Vec<Vec<Option<&Entity>>> {
        self.grid.snapshot()
    }

    /// Topmost entity at a cell, `None` when empty or off the grid.
    pub fn entity_at(&self, y: i32, x: i32) -> Option<&Entity> {
        self.grid.tile_at(y, x).and_then(Tile::top)
    }

    /// Look up a live entity; `None` once it left the simulation.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.grid.entity(id)
    }

    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.grid.position_of(id)
    }

    pub fn list(&self, species: Species) -> &[EntityId] {
        self.roster.list(species)
    }

    pub fn population(&self) -> Population {
        let mut population = Population::default();
        for species in Species::all() {
            population.set(species, self.roster.len(species));
        }
        population
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &EcosystemConfig {
        &self.config
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            tick: self.tick,
            births: self.births,
            deaths: self.deaths,
            kills: self.kills,
            population: self.population(),
        }
    }

    /// Check that the live lists and the grid describe the same entities.
    pub fn verify_consistency(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for (species, id) in self.roster.iter() {
            if !seen.insert(id) {
                return Err(Error::InvalidState(format!("{id} listed twice")));
            }
            match self.grid.entity(id) {
                Some(entity) if entity.species() == species => {}
                Some(entity) => {
                    return Err(Error::InvalidState(format!(
                        "{id} listed as {species} but is a {}",
                        entity.species()
                    )))
                }
                None => {
                    return Err(Error::InvalidState(format!(
                        "{species} {id} listed live but not attached"
                    )))
                }
            }
        }

        let attached = self.grid.population();
        if attached != seen.len() {
            return Err(Error::InvalidState(format!(
                "{attached} entities attached but {} listed",
                seen.len()
            )));
        }
        Ok(())
    }

    fn emit_population_metrics(&self) {
        let population = self.population();
        info!(
            event = "population_metrics",
            tick = self.tick,
            water = population.water,
            protozoa = population.protozoa,
            rain_forests = population.rain_forests,
            plants = population.plants,
            herbivores = population.herbivores,
            carnivores = population.carnivores,
            births = self.births,
            deaths = self.deaths,
            "Tick {}: {} entities alive",
            self.tick,
            population.total()
        );
    }
}

/// Live entity count per species.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    pub beaches: usize,
    pub water: usize,
    pub protozoa: usize,
    pub rain_forests: usize,
    pub plants: usize,
    pub herbivores: usize,
    pub carnivores: usize,
}

impl Population {
    pub fn get(&self, species: Species) -> usize {
        match species {
            Species::Border => 0,
            Species::Beach => self.beaches,
            Species::Water => self.water,
            Species::Protozoan => self.protozoa,
            Species::RainForest => self.rain_forests,
            Species::Plant => self.plants,
            Species::Herbivore => self.herbivores,
            Species::Carnivore => self.carnivores,
        }
    }

    fn set(&mut self, species: Species, count: usize) {
        let slot = match species {
            Species::Border => return,
            Species::Beach => &mut self.beaches,
            Species::Water => &mut self.water,
            Species::Protozoan => &mut self.protozoa,
            Species::RainForest => &mut self.rain_forests,
            Species::Plant => &mut self.plants,
            Species::Herbivore => &mut self.herbivores,
            Species::Carnivore => &mut self.carnivores,
        };
        *slot = count;
    }

    pub fn total(&self) -> usize {
        Species::all().into_iter().map(|species| self.get(species)).sum()
    }
}

/// Outcome of [`Simulation::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub tick: u64,
    pub births: u64,
    pub deaths: u64,
    pub kills: u64,
    pub population: Population,
}
