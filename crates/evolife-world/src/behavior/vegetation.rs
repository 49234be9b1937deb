//! Plant and rainforest rules: growth, evolution.

use super::{location_of, pick, ActionResult};
use crate::entity::{EntityKind, Growth};
use crate::grid::{Grid, TileRef};
use evolife_core::{EcosystemConfig, EntityId, Level, Species};
use rand::Rng;
use tracing::{debug, trace};

pub(super) fn rain_forest_act<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    config: &EcosystemConfig,
    rng: &mut R,
) -> ActionResult {
    try_growth(grid, id, config, rng, |kind| match kind {
        EntityKind::RainForest(forest) => &mut forest.growth,
        _ => panic!("entity {id} is not a rainforest"),
    })
}

/// A plant evolves when it can; otherwise it tries to grow.
pub(super) fn plant_act<R: Rng>(
    grid: &mut Grid,
    id: EntityId,
    config: &EcosystemConfig,
    rng: &mut R,
) -> ActionResult {
    let at = location_of(grid, id);
    let stage = match grid.entity(id).and_then(|entity| entity.kind().as_plant()) {
        Some(plant) => plant.stage(),
        None => panic!("entity {id} is not a plant"),
    };
    let enclosed = is_enclosed(grid, at, stage);

    let evolved = grid
        .entity_mut(id)
        .and_then(|entity| entity.kind_mut().as_plant_mut())
        .is_some_and(|plant| plant.advance_evolution(enclosed, &config.plant, rng));
    if evolved {
        debug!(plant = %id, level = stage + 1, "Plant evolved");
        return ActionResult::idle();
    }

    try_growth(grid, id, config, rng, |kind| match kind {
        EntityKind::Plant(plant) => &mut plant.growth,
        _ => panic!("entity {id} is not a plant"),
    })
}

/// Whether every adjacent tile holds a border or vegetation of at least
/// `stage`.
fn is_enclosed(grid: &Grid, at: TileRef, stage: u8) -> bool {
    grid.neighbors(at).iter().all(|&neighbor| {
        let tile = grid.tile(neighbor);
        let tall_enough = tile
            .vegetation()
            .and_then(|veg| veg.level())
            .is_some_and(|level| level >= Level::Stage(stage));
        tall_enough || tile.contains(Species::Border)
    })
}

/// Run the reproduction countdown and plant a level-0 seedling on a random
/// empty neighbor when it elapses.
fn try_growth<R, F>(
    grid: &mut Grid,
    id: EntityId,
    config: &EcosystemConfig,
    rng: &mut R,
    growth_of: F,
) -> ActionResult
where
    R: Rng,
    F: FnOnce(&mut EntityKind) -> &mut Growth,
{
    let at = location_of(grid, id);
    let free: Vec<TileRef> = grid
        .neighbors(at)
        .iter()
        .copied()
        .filter(|&tile| grid.tile(tile).is_empty())
        .collect();

    let range = config.vegetation.ticks_repro_range;
    let ready = match grid.entity_mut(id) {
        Some(entity) => growth_of(entity.kind_mut()).advance(!free.is_empty(), range, rng),
        None => panic!("acting entity {id} is not attached"),
    };
    if !ready {
        return ActionResult::idle();
    }

    match pick(&free, rng) {
        Some(spot) => {
            let seedling = grid.spawn(EntityKind::plant(config, 0), spot);
            trace!(parent = %id, seedling = %seedling, "Plant seeded");
            ActionResult::offspring(seedling)
        }
        None => ActionResult::idle(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::EntityMap;
    use evolife_core::Position;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fixed_ranges() -> EcosystemConfig {
        let mut config = EcosystemConfig::default();
        config.vegetation.ticks_repro_range = (2, 2);
        config.plant.ticks_evo_range = (2, 2);
        config
    }

    fn plant_stage(grid: &Grid, id: EntityId) -> u8 {
        grid.entity(id).unwrap().kind().as_plant().unwrap().stage()
    }

    #[test]
    fn test_rain_forest_seeds_empty_neighbor() {
        let config = fixed_ranges();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let map: EntityMap = vec![vec![Some(EntityKind::rain_forest()), None]];
        let mut grid = Grid::build(map).unwrap();
        let forest = grid.tile_at(0, 0).unwrap().top().unwrap().id();

        assert_eq!(rain_forest_act(&mut grid, forest, &config, &mut rng), ActionResult::idle());
        assert_eq!(rain_forest_act(&mut grid, forest, &config, &mut rng), ActionResult::idle());
        let result = rain_forest_act(&mut grid, forest, &config, &mut rng);
        let seedling = result.offspring.unwrap();

        assert_eq!(grid.position_of(seedling), Some(Position::new(0, 1)));
        assert_eq!(plant_stage(&grid, seedling), 0);
        // no room left, so the next countdown never starts
        assert_eq!(rain_forest_act(&mut grid, forest, &config, &mut rng), ActionResult::idle());
        match grid.entity(forest).unwrap().kind() {
            EntityKind::RainForest(forest) => assert_eq!(forest.growth.ticks_to_reproduce, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plant_evolves_inside_border() {
        let config = fixed_ranges();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut grid = Grid::build(vec![vec![Some(EntityKind::plant(&config, 0))]]).unwrap();
        let plant = grid.tile_at(0, 0).unwrap().top().unwrap().id();

        for _ in 0..3 {
            assert_eq!(plant_stage(&grid, plant), 0);
            plant_act(&mut grid, plant, &config, &mut rng);
        }
        assert_eq!(plant_stage(&grid, plant), 1);
        for _ in 0..3 {
            plant_act(&mut grid, plant, &config, &mut rng);
        }
        assert_eq!(plant_stage(&grid, plant), 2);
        for _ in 0..10 {
            plant_act(&mut grid, plant, &config, &mut rng);
        }
        assert_eq!(plant_stage(&grid, plant), 2);
    }

    #[test]
    fn test_lower_vegetation_blocks_evolution() {
        let config = fixed_ranges();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let map: EntityMap = vec![vec![
            Some(EntityKind::plant(&config, 1)),
            Some(EntityKind::plant(&config, 0)),
        ]];
        let mut grid = Grid::build(map).unwrap();
        let tall = grid.tile_at(0, 0).unwrap().top().unwrap().id();
        let short = grid.tile_at(0, 1).unwrap().top().unwrap().id();

        for _ in 0..6 {
            plant_act(&mut grid, tall, &config, &mut rng);
        }
        assert_eq!(plant_stage(&grid, tall), 1);

        for _ in 0..3 {
            plant_act(&mut grid, short, &config, &mut rng);
        }
        assert_eq!(plant_stage(&grid, short), 1);
    }

    #[test]
    fn test_rain_forest_counts_as_taller_vegetation() {
        let config = fixed_ranges();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let map: EntityMap = vec![vec![
            Some(EntityKind::plant(&config, 1)),
            Some(EntityKind::rain_forest()),
        ]];
        let mut grid = Grid::build(map).unwrap();
        let plant = grid.tile_at(0, 0).unwrap().top().unwrap().id();
        let at = grid.index_of(Position::new(0, 0)).unwrap();

        assert!(is_enclosed(&grid, at, 1));
        for _ in 0..3 {
            plant_act(&mut grid, plant, &config, &mut rng);
        }
        assert_eq!(plant_stage(&grid, plant), 2);
    }
}
