//! Per-species behavior rules.
//!
//! Every rule reads the acting entity's neighborhood from the grid, decides
//! on one action and applies it right away. The returned [`ActionResult`]
//! tells the scheduler how the species lists have to change.

mod aquatic;
mod land_animal;
mod vegetation;

use crate::entity::Occupant;
use crate::grid::{Grid, TileRef};
use evolife_core::{EcosystemConfig, EntityId, Species};
use rand::seq::SliceRandom;
use rand::Rng;

/// Outcome of one entity's turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionResult {
    /// The actor left the simulation this turn.
    pub death: bool,
    /// Newly created entity, already attached to its tile.
    pub offspring: Option<EntityId>,
    /// Prey detached by the actor.
    pub killed_prey: Option<EntityId>,
}

impl ActionResult {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn death() -> Self {
        Self {
            death: true,
            ..Self::default()
        }
    }

    pub fn offspring(id: EntityId) -> Self {
        Self {
            offspring: Some(id),
            ..Self::default()
        }
    }

    pub fn killed(prey: Option<EntityId>) -> Self {
        Self {
            killed_prey: prey,
            ..Self::default()
        }
    }
}

/// Let the entity `id` take its turn.
///
/// # Panics
/// If `id` is not attached to the grid: live lists and tiles went out of
/// sync, which is a scheduler defect.
pub fn act<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    config: &EcosystemConfig,
    rng: &mut R,
) -> ActionResult {
    let Some(entity) = grid.entity(id) else {
        panic!("entity {id} is listed live but not attached to any tile");
    };

    match entity.species() {
        Species::Water => aquatic::water_act(grid, id, config, rng),
        Species::Protozoan => aquatic::protozoan_act(grid, id, config, rng),
        Species::RainForest => vegetation::rain_forest_act(grid, id, config, rng),
        Species::Plant => vegetation::plant_act(grid, id, config, rng),
        species @ (Species::Herbivore | Species::Carnivore) => {
            land_animal::act(grid, id, species, config, rng)
        }
        Species::Border | Species::Beach => ActionResult::idle(),
    }
}

/// Location of an acting entity.
fn location_of(grid: &Grid, id: EntityId) -> TileRef {
    match grid.location(id) {
        Some(at) => at,
        None => panic!("acting entity {id} is not attached"),
    }
}

/// Take an entity off the grid for good.
fn remove(grid: &mut Grid, id: EntityId) {
    if grid.detach(id).is_none() {
        panic!("entity {id} left the grid while still acting");
    }
}

/// Adjacent tiles a mover of `level` may step onto.
fn walkable_neighbors(grid: &Grid, at: TileRef, level: u8) -> Vec<TileRef> {
    grid.neighbors(at)
        .iter()
        .copied()
        .filter(|&tile| grid.tile(tile).is_walkable(level))
        .collect()
}

fn pick<T: Copy, R: Rng>(items: &[T], rng: &mut R) -> Option<T> {
    items.choose(rng).copied()
}

/// Percent-chance draw.
fn roll<R: Rng>(chance: u32, rng: &mut R) -> bool {
    rng.gen_range(0..100) < chance
}
