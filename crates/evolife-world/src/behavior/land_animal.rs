//! Herbivore and carnivore rules.
//!
//! A land animal's turn runs in a fixed order: it ages, then either hunts
//! (when its food reserve is empty) or eats from its reserve and tries to
//! mate, and finally moves unless the turn was already decided.

use super::{location_of, pick, remove, roll, walkable_neighbors, ActionResult};
use crate::entity::{EntityKind, LandAnimal};
use crate::grid::{Grid, TileRef};
use evolife_core::{Direction, EcosystemConfig, EntityId, LandAnimalConfig, Level, Species};
use rand::Rng;
use tracing::{debug, trace};

enum Hunt {
    Missed,
    Ate { killed: Option<EntityId> },
}

pub(super) fn act<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    species: Species,
    config: &EcosystemConfig,
    rng: &mut R,
) -> ActionResult {
    let table = config.land_animal(species);
    let Some(prey) = species.prey() else {
        panic!("{species} has no prey");
    };
    let at = location_of(grid, id);

    if !grow_older(grid, id) {
        remove(grid, id);
        debug!(animal = %id, %species, "Died of old age");
        return ActionResult::death();
    }

    if animal(grid, id).is_hungry() {
        match hunt(grid, id, at, prey, config, table, rng) {
            Hunt::Ate { killed } => return ActionResult::killed(killed),
            Hunt::Missed => {
                if !survive_without_food(grid, id) {
                    remove(grid, id);
                    debug!(animal = %id, %species, "Starved");
                    return ActionResult::death();
                }
            }
        }
    } else {
        consume_from_reserve(grid, id);
        if animal(grid, id).ready_to_mate {
            if let Some(child) = try_reproduction(grid, id, at, species, config, table, rng) {
                return ActionResult::offspring(child);
            }
        }
    }

    if step(grid, id, at, species, prey, table, rng) {
        ActionResult::idle()
    } else {
        remove(grid, id);
        debug!(animal = %id, %species, "Trapped with nowhere to go");
        ActionResult::death()
    }
}

fn animal(grid: &Grid, id: EntityId) -> &LandAnimal {
    match grid.entity(id).and_then(|entity| entity.kind().as_land_animal()) {
        Some(animal) => animal,
        None => panic!("entity {id} is not an attached land animal"),
    }
}

fn animal_mut(grid: &mut Grid, id: EntityId) -> &mut LandAnimal {
    match grid
        .entity_mut(id)
        .and_then(|entity| entity.kind_mut().as_land_animal_mut())
    {
        Some(animal) => animal,
        None => panic!("entity {id} is not an attached land animal"),
    }
}

/// Returns `false` once the time to live runs out.
fn grow_older(grid: &mut Grid, id: EntityId) -> bool {
    let animal = animal_mut(grid, id);
    animal.time_to_live = animal.time_to_live.saturating_sub(1);
    animal.time_to_live > 0
}

/// Returns `false` once the energy runs out.
fn survive_without_food(grid: &mut Grid, id: EntityId) -> bool {
    let animal = animal_mut(grid, id);
    animal.ready_to_mate = false;
    animal.energy = animal.energy.saturating_sub(1);
    animal.energy > 0
}

fn consume_from_reserve(grid: &mut Grid, id: EntityId) {
    let animal = animal_mut(grid, id);
    animal.food = animal.food.saturating_sub(1);
    if animal.food == 0 {
        animal.ready_to_mate = false;
    }
}

/// Attack a random prey on an adjacent tile.
///
/// The hunter gains the prey's current health as food but at most one
/// point of energy, capped at the replenish ceiling.
fn hunt<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    at: TileRef,
    prey: Species,
    config: &EcosystemConfig,
    table: &LandAnimalConfig,
    rng: &mut R,
) -> Hunt {
    let candidates: Vec<EntityId> = grid
        .neighbors(at)
        .iter()
        .filter_map(|&tile| grid.tile(tile).find(prey, None).map(|entity| entity.id()))
        .collect();
    let Some(target) = pick(&candidates, rng) else {
        return Hunt::Missed;
    };

    let prey_health = match grid.entity(target).and_then(|entity| entity.kind().health()) {
        Some(health) => health,
        None => panic!("prey {target} is not an attached {prey}"),
    };

    let hunter = animal_mut(grid, id);
    hunter.food += prey_health.max(0) as u32;
    hunter.energy = table.min_energy_replenish.min(hunter.energy + 1);
    hunter.ready_to_mate = true;
    let attack = hunter.attack;

    let remaining = match grid
        .entity_mut(target)
        .and_then(|entity| entity.kind_mut().wound(attack))
    {
        Some(remaining) => remaining,
        None => panic!("prey {target} is not an attached {prey}"),
    };
    if remaining <= 0 {
        remove(grid, target);
        debug!(hunter = %id, prey = %target, prey_species = %prey, "Prey killed");
        return Hunt::Ate {
            killed: Some(target),
        };
    }

    if let Some(plant) = grid
        .entity_mut(target)
        .and_then(|entity| entity.kind_mut().as_plant_mut())
    {
        if plant.stage() > 0 {
            plant.devolve(&config.plant);
            debug!(plant = %target, level = plant.stage(), "Plant devolved");
        }
    }

    Hunt::Ate { killed: None }
}

/// Mate with a ready neighbor of the same species and level.
///
/// The child may be born one level up; if the birthplace does not tolerate
/// the parents' level either, the blocking vegetation decides its level.
fn try_reproduction<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    at: TileRef,
    species: Species,
    config: &EcosystemConfig,
    table: &LandAnimalConfig,
    rng: &mut R,
) -> Option<EntityId> {
    let level = animal(grid, id).stage();

    let mates: Vec<EntityId> = grid
        .neighbors(at)
        .iter()
        .filter_map(|&tile| grid.tile(tile).find(species, Some(level)))
        .filter(|mate| {
            mate.kind()
                .as_land_animal()
                .is_some_and(|mate| mate.ready_to_mate)
        })
        .map(|mate| mate.id())
        .collect();
    if mates.is_empty() {
        trace!(animal = %id, "No mate nearby");
        return None;
    }

    let birthplaces = walkable_neighbors(grid, at, 0);
    let Some(birthplace) = pick(&birthplaces, rng) else {
        trace!(animal = %id, "No room for offspring");
        return None;
    };
    let mate = pick(&mates, rng)?;

    animal_mut(grid, id).ready_to_mate = false;
    animal_mut(grid, mate).ready_to_mate = false;

    let tile = grid.tile(birthplace);
    let child_level = if roll(table.level_up_chance, rng)
        && level < table.max_level
        && tile.is_walkable(level + 1)
    {
        level + 1
    } else if tile.is_walkable(level) {
        level
    } else {
        match tile.vegetation().and_then(|veg| veg.level()) {
            Some(Level::Stage(stage)) => stage.saturating_sub(1),
            _ => 0,
        }
    };

    let child = grid.spawn(EntityKind::land_animal(config, species, child_level), birthplace);
    debug!(
        parent = %id,
        mate = %mate,
        child = %child,
        %species,
        level = child_level,
        "Offspring born"
    );
    Some(child)
}

/// Move one tile: toward a mate when ready, toward the strongest prey when
/// hungry or fully grown, else at random. Returns `false` when boxed in.
fn step<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    at: TileRef,
    species: Species,
    prey: Species,
    table: &LandAnimalConfig,
    rng: &mut R,
) -> bool {
    let (level, ready, hungry, view_range) = {
        let animal = animal(grid, id);
        (
            animal.stage(),
            animal.ready_to_mate,
            animal.is_hungry(),
            animal.view_range,
        )
    };

    let directed = if ready {
        route(grid, at, species, Some(level), false, view_range, level, rng)
    } else if hungry || level == table.max_level {
        route(grid, at, prey, None, true, view_range, level, rng)
    } else {
        None
    };

    let target = match directed {
        Some(tile) => Some(tile),
        None => pick(&walkable_neighbors(grid, at, level), rng),
    };

    match target {
        Some(tile) => {
            grid.relocate(id, tile);
            true
        }
        None => false,
    }
}

/// Step toward a random member of `target` on the nearest ring that has any.
///
/// With `strongest`, only candidates of the highest level on that ring are
/// considered. Returns `None` if nothing is in view or the step is blocked.
#[allow(clippy::too_many_arguments)]
fn route<R: Rng>(
    grid: &Grid,
    at: TileRef,
    target: Species,
    stage: Option<u8>,
    strongest: bool,
    view_range: usize,
    mover_level: u8,
    rng: &mut R,
) -> Option<TileRef> {
    let mut candidates = search_candidates(grid, at, target, stage, view_range);
    if strongest {
        let top = candidates.iter().map(|&(_, level)| level).max()?;
        candidates.retain(|&(_, level)| level == top);
    }

    let (wanted, _) = pick(&candidates, rng)?;
    let direction = Direction::toward(grid.tile(at).position(), grid.tile(wanted).position())?;
    let next = grid.neighbors(at)[direction.slot()];
    if grid.tile(next).is_walkable(mover_level) {
        Some(next)
    } else {
        trace!(?direction, "Step toward target blocked");
        None
    }
}

/// Candidates on the nearest ring, scanning outward from radius 2.
///
/// The adjacent ring is skipped on purpose. Hunting and mating already
/// handle it, so a neighbor that could not be eaten or mated this turn
/// never pins the mover in place.
fn search_candidates(
    grid: &Grid,
    at: TileRef,
    target: Species,
    stage: Option<u8>,
    view_range: usize,
) -> Vec<(TileRef, Option<Level>)> {
    for radius in 2..=view_range {
        let found: Vec<_> = grid
            .ring(at, radius)
            .iter()
            .filter_map(|&tile| {
                grid.tile(tile)
                    .find(target, stage)
                    .map(|entity| (tile, entity.level()))
            })
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}
