//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::Species;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of configured levels for leveled species.
pub const LEVELS: usize = 3;

/// Number of neighborhood rings precomputed around every tile.
pub const RING_COUNT: usize = 8;

/// Water parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    /// Chance (percent) per tick to spawn a protozoan
    pub spawn_chance: u32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self { spawn_chance: 1 }
    }
}

/// Protozoan parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtozoanConfig {
    pub time_to_live: u32,
    /// Chance (percent) that metamorphosis yields a herbivore rather than a carnivore
    pub herbivore_chance: u32,
}

impl Default for ProtozoanConfig {
    fn default() -> Self {
        Self {
            time_to_live: 20,
            herbivore_chance: 80,
        }
    }
}

/// Parameters shared by plants and rainforests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationConfig {
    /// Inclusive range the reproduction countdown is drawn from
    pub ticks_repro_range: (u32, u32),
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            ticks_repro_range: (10, 40),
        }
    }
}

/// Plant parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub max_level: u8,
    pub health: [i32; LEVELS],
    /// Inclusive range the evolution countdown is drawn from
    pub ticks_evo_range: (u32, u32),
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            max_level: 2,
            health: [5, 10, 15],
            ticks_evo_range: (40, 100),
        }
    }
}

/// Herbivore and carnivore parameters, indexed by level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandAnimalConfig {
    pub max_level: u8,
    pub time_to_live: [u32; LEVELS],
    /// Outermost ring scanned when looking for mates or prey
    pub view_range: [usize; LEVELS],
    pub food: [u32; LEVELS],
    pub energy: [u32; LEVELS],
    pub health: [i32; LEVELS],
    pub attack: [i32; LEVELS],
    /// Chance (percent) that offspring is born one level above its parents
    pub level_up_chance: u32,
    /// Ceiling for the energy regained by a successful hunt
    pub min_energy_replenish: u32,
}

impl Default for LandAnimalConfig {
    fn default() -> Self {
        Self {
            max_level: 2,
            time_to_live: [50, 100, 150],
            view_range: [4, 6, 8],
            food: [10, 10, 10],
            energy: [10, 20, 30],
            health: [5, 10, 15],
            attack: [5, 10, 15],
            level_up_chance: 50,
            min_energy_replenish: 10,
        }
    }
}

/// Fixed species tables handed to the scheduler at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    pub water: WaterConfig,
    pub protozoan: ProtozoanConfig,
    pub vegetation: VegetationConfig,
    pub plant: PlantConfig,
    pub herbivore: LandAnimalConfig,
    pub carnivore: LandAnimalConfig,
}

impl EcosystemConfig {
    /// Table of a land animal species.
    ///
    /// # Panics
    /// If `species` is not a land animal.
    pub fn land_animal(&self, species: Species) -> &LandAnimalConfig {
        match species {
            Species::Herbivore => &self.herbivore,
            Species::Carnivore => &self.carnivore,
            other => panic!("{other} has no land animal table"),
        }
    }

    /// Reject tables the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        check_range("vegetation.ticks_repro_range", self.vegetation.ticks_repro_range)?;
        check_range("plant.ticks_evo_range", self.plant.ticks_evo_range)?;
        check_max_level("plant", self.plant.max_level)?;

        for (name, table) in [("herbivore", &self.herbivore), ("carnivore", &self.carnivore)] {
            check_max_level(name, table.max_level)?;
            if let Some(range) = table.view_range.iter().find(|&&range| range > RING_COUNT) {
                return Err(Error::InvalidConfig(format!(
                    "{name}.view_range {range} exceeds the {RING_COUNT} precomputed rings"
                )));
            }
        }
        Ok(())
    }
}

fn check_range(name: &str, (low, high): (u32, u32)) -> Result<()> {
    if low > high {
        return Err(Error::InvalidConfig(format!(
            "{name} is empty: {low} > {high}"
        )));
    }
    Ok(())
}

fn check_max_level(name: &str, max_level: u8) -> Result<()> {
    if max_level as usize >= LEVELS {
        return Err(Error::InvalidConfig(format!(
            "{name}.max_level {max_level} has no table row (levels 0..{LEVELS})"
        )));
    }
    Ok(())
}

/// Headless runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of ticks to run
    pub num_ticks: u64,
    /// Ticks between population reports
    pub report_interval: u64,
    /// Symbolic map file; the bundled map is used when absent
    pub map_path: Option<String>,
    /// Species tables
    pub ecosystem: EcosystemConfig,
}

impl RunnerConfig {
    /// Read a JSON configuration file; absent fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.ecosystem.validate()?;
        Ok(config)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_ticks: 1_000,
            report_interval: 100,
            map_path: None,
            ecosystem: EcosystemConfig::default(),
        }
    }
}
