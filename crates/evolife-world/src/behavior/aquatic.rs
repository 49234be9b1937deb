//! Water and protozoan rules.

use super::{location_of, pick, remove, roll, walkable_neighbors, ActionResult};
use crate::entity::{EntityKind, Occupant};
use crate::grid::Grid;
use evolife_core::{EcosystemConfig, EntityId, Species};
use rand::Rng;
use tracing::{debug, trace};

/// Water occasionally spawns a protozoan on itself.
pub(super) fn water_act<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    config: &EcosystemConfig,
    rng: &mut R,
) -> ActionResult {
    let at = location_of(grid, id);
    if !roll(config.water.spawn_chance, rng) || grid.tile(at).contains(Species::Protozoan) {
        return ActionResult::idle();
    }

    let protozoan = grid.spawn(EntityKind::protozoan(config), at);
    trace!(water = %id, protozoan = %protozoan, "Protozoan spawned");
    ActionResult::offspring(protozoan)
}

/// A protozoan leaves the water as soon as it can, otherwise swims on.
///
/// Metamorphosis is reported as the protozoan's death plus the new land
/// animal as offspring.
pub(super) fn protozoan_act<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    config: &EcosystemConfig,
    rng: &mut R,
) -> ActionResult {
    let at = location_of(grid, id);

    let beaches = walkable_neighbors(grid, at, 0);
    if let Some(beach) = pick(&beaches, rng) {
        remove(grid, id);
        let species = if roll(config.protozoan.herbivore_chance, rng) {
            Species::Herbivore
        } else {
            Species::Carnivore
        };
        let animal = grid.spawn(EntityKind::land_animal(config, species, 0), beach);
        debug!(protozoan = %id, animal = %animal, %species, "Protozoan metamorphosed");
        return ActionResult {
            death: true,
            offspring: Some(animal),
            killed_prey: None,
        };
    }

    let expired = match grid.entity_mut(id).map(|entity| entity.kind_mut()) {
        Some(EntityKind::Protozoan(protozoan)) => {
            protozoan.time_to_live = protozoan.time_to_live.saturating_sub(1);
            protozoan.time_to_live == 0
        }
        _ => panic!("entity {id} is not a protozoan"),
    };
    if expired {
        remove(grid, id);
        trace!(protozoan = %id, "Protozoan died of old age");
        return ActionResult::death();
    }

    let swimmable: Vec<_> = grid
        .neighbors(at)
        .iter()
        .copied()
        .filter(|&tile| {
            grid.tile(tile)
                .top()
                .is_some_and(|top| top.species() == Species::Water)
        })
        .collect();

    match pick(&swimmable, rng) {
        Some(target) => {
            grid.relocate(id, target);
            ActionResult::idle()
        }
        None => {
            remove(grid, id);
            trace!(protozoan = %id, "Protozoan stranded");
            ActionResult::death()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::EntityMap;
    use evolife_core::Position;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn certain_spawn() -> EcosystemConfig {
        let mut config = EcosystemConfig::default();
        config.water.spawn_chance = 100;
        config
    }

    #[test]
    fn test_water_spawns_once_per_tile() {
        let config = certain_spawn();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut grid = Grid::build(vec![vec![Some(EntityKind::Water)]]).unwrap();
        let water = grid.tile_at(0, 0).unwrap().top().unwrap().id();

        let first = water_act(&mut grid, water, &config, &mut rng);
        assert!(first.offspring.is_some());
        let second = water_act(&mut grid, water, &config, &mut rng);
        assert_eq!(second, ActionResult::idle());
        assert_eq!(grid.tile_at(0, 0).unwrap().entities().len(), 2);
    }

    #[test]
    fn test_water_never_spawns_at_zero_chance() {
        let mut config = EcosystemConfig::default();
        config.water.spawn_chance = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut grid = Grid::build(vec![vec![Some(EntityKind::Water)]]).unwrap();
        let water = grid.tile_at(0, 0).unwrap().top().unwrap().id();

        for _ in 0..200 {
            assert_eq!(water_act(&mut grid, water, &config, &mut rng), ActionResult::idle());
        }
    }

    #[test]
    fn test_protozoan_metamorphoses_onto_beach() {
        let config = EcosystemConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let map: EntityMap = vec![vec![Some(EntityKind::Water), Some(EntityKind::Beach)]];
        let mut grid = Grid::build(map).unwrap();
        let water = grid.index_of(Position::new(0, 0)).unwrap();
        let protozoan = grid.spawn(EntityKind::protozoan(&config), water);

        let result = protozoan_act(&mut grid, protozoan, &config, &mut rng);
        assert!(result.death);
        assert!(!grid.is_attached(protozoan));

        let animal = grid.entity(result.offspring.unwrap()).unwrap();
        assert!(animal.species().is_land_animal());
        assert_eq!(animal.level(), Some(evolife_core::Level::Stage(0)));
        assert_eq!(grid.position_of(animal.id()), Some(Position::new(0, 1)));
    }

    #[test]
    fn test_protozoan_swims_to_free_water() {
        let config = EcosystemConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let map: EntityMap = vec![vec![Some(EntityKind::Water), Some(EntityKind::Water)]];
        let mut grid = Grid::build(map).unwrap();
        let left = grid.index_of(Position::new(0, 0)).unwrap();
        let protozoan = grid.spawn(EntityKind::protozoan(&config), left);

        let result = protozoan_act(&mut grid, protozoan, &config, &mut rng);
        assert_eq!(result, ActionResult::idle());
        assert_eq!(grid.position_of(protozoan), Some(Position::new(0, 1)));
        assert_eq!(
            grid.entity(protozoan).unwrap().stats().time_to_live,
            Some(config.protozoan.time_to_live - 1)
        );
    }

    #[test]
    fn test_protozoan_dies_without_water_around() {
        let config = EcosystemConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut grid = Grid::build(vec![vec![Some(EntityKind::Water)]]).unwrap();
        let at = grid.index_of(Position::new(0, 0)).unwrap();
        let protozoan = grid.spawn(EntityKind::protozoan(&config), at);

        let result = protozoan_act(&mut grid, protozoan, &config, &mut rng);
        assert_eq!(result, ActionResult::death());
        assert!(!grid.is_attached(protozoan));
    }

    #[test]
    fn test_protozoan_dies_of_old_age() {
        let mut config = EcosystemConfig::default();
        config.protozoan.time_to_live = 1;
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let map: EntityMap = vec![vec![Some(EntityKind::Water), Some(EntityKind::Water)]];
        let mut grid = Grid::build(map).unwrap();
        let left = grid.index_of(Position::new(0, 0)).unwrap();
        let protozoan = grid.spawn(EntityKind::protozoan(&config), left);

        assert_eq!(
            protozoan_act(&mut grid, protozoan, &config, &mut rng),
            ActionResult::death()
        );
        assert!(!grid.is_attached(protozoan));
    }
}
