//! 2D grid of stacked tiles with precomputed neighborhood rings.

use crate::entity::{Entity, EntityKind, Occupant};
use evolife_core::{EntityId, Error, Position, Result, Species, RING_COUNT};
use std::collections::HashMap;

/// Initial layout handed to [`Grid::build`], one optional entity per cell.
pub type EntityMap = Vec<Vec<Option<EntityKind>>>;

/// Id carried by the entity on the shared border tile.
pub const BORDER_ID: EntityId = EntityId(0);

/// Handle to a tile: a grid cell, or the shared border sentinel that stands
/// in for every off-grid neighbor at radius 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileRef {
    Cell(usize),
    Border,
}

/// One grid cell holding a stack of entities.
///
/// The last entity of the stack is the topmost, visible occupant.
#[derive(Debug, Clone)]
pub struct Tile {
    position: Position,
    stack: Vec<Entity>,
    rings: Vec<Vec<TileRef>>,
}

impl Tile {
    fn new(position: Position) -> Self {
        Self {
            position,
            stack: Vec::new(),
            rings: Vec::new(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn push(&mut self, entity: Entity) {
        self.stack.push(entity);
    }

    pub(crate) fn pop(&mut self) -> Option<Entity> {
        self.stack.pop()
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.stack.iter().position(|entity| entity.id() == id)?;
        Some(self.stack.remove(index))
    }

    pub fn top(&self) -> Option<&Entity> {
        self.stack.last()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Whether a mover of `level` may step onto this tile.
    pub fn is_walkable(&self, level: u8) -> bool {
        self.stack
            .iter()
            .all(|entity| entity.step_allowance().permits(level))
    }

    /// Entities on the tile, bottom first.
    pub fn entities(&self) -> &[Entity] {
        &self.stack
    }

    /// First entity of `species`, optionally restricted to a level stage.
    pub fn find(&self, species: Species, stage: Option<u8>) -> Option<&Entity> {
        self.stack.iter().find(|entity| {
            entity.species() == species
                && stage.map_or(true, |stage| {
                    entity.level().and_then(|level| level.stage()) == Some(stage)
                })
        })
    }

    pub fn contains(&self, species: Species) -> bool {
        self.find(species, None).is_some()
    }

    /// First plant or rainforest on the tile.
    pub fn vegetation(&self) -> Option<&Entity> {
        self.stack
            .iter()
            .find(|entity| entity.species().is_vegetation())
    }

    /// Tiles at exactly Chebyshev distance `radius` (1-based).
    ///
    /// Radius 1 always has eight entries in compass slot order; outer rings
    /// omit off-grid positions. Unknown radii yield an empty ring.
    pub fn ring(&self, radius: usize) -> &[TileRef] {
        radius
            .checked_sub(1)
            .and_then(|index| self.rings.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Rectangular grid owning every tile and, through them, every entity.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    tiles: Vec<Tile>,
    border: Tile,
    locations: HashMap<EntityId, TileRef>,
    next_id: u64,
}

impl Grid {
    /// Build the grid from an initial layout and precompute all rings.
    ///
    /// The layout must be rectangular and non-empty.
    pub fn build(entity_map: EntityMap) -> Result<Self> {
        let height = entity_map.len();
        let width = entity_map.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(Error::InvalidMap("map has no cells".to_string()));
        }
        if let Some((row, line)) = entity_map
            .iter()
            .enumerate()
            .find(|(_, line)| line.len() != width)
        {
            return Err(Error::InvalidMap(format!(
                "row {} has {} cells, expected {}",
                row,
                line.len(),
                width
            )));
        }

        let mut border = Tile::new(Position::new(-1, -1));
        border.push(Entity::new(BORDER_ID, EntityKind::Border));

        let mut grid = Self {
            width: width as i32,
            height: height as i32,
            tiles: Vec::with_capacity(width * height),
            border,
            locations: HashMap::new(),
            next_id: BORDER_ID.0 + 1,
        };

        for (y, line) in entity_map.into_iter().enumerate() {
            for (x, cell) in line.into_iter().enumerate() {
                grid.tiles.push(Tile::new(Position::new(y as i32, x as i32)));
                if let Some(kind) = cell {
                    let at = TileRef::Cell(grid.tiles.len() - 1);
                    grid.spawn(kind, at);
                }
            }
        }

        grid.setup_rings();
        Ok(grid)
    }

    fn setup_rings(&mut self) {
        for index in 0..self.tiles.len() {
            let center = self.tiles[index].position;
            let rings = (1..=RING_COUNT as i32)
                .map(|radius| self.calc_ring(center, radius))
                .collect();
            self.tiles[index].rings = rings;
        }
    }

    /// Square ring around `center`: top row, left column, right column,
    /// bottom row, each scanned in increasing coordinate order.
    fn calc_ring(&self, center: Position, radius: i32) -> Vec<TileRef> {
        let mut ring = Vec::with_capacity(8 * radius as usize);
        let span = -radius..=radius;
        let inner = -radius + 1..radius;

        for dx in span.clone() {
            self.push_ring_tile(&mut ring, center.add(-radius, dx), radius);
        }
        for dy in inner.clone() {
            self.push_ring_tile(&mut ring, center.add(dy, -radius), radius);
        }
        for dy in inner {
            self.push_ring_tile(&mut ring, center.add(dy, radius), radius);
        }
        for dx in span {
            self.push_ring_tile(&mut ring, center.add(radius, dx), radius);
        }

        ring
    }

    fn push_ring_tile(&self, ring: &mut Vec<TileRef>, pos: Position, radius: i32) {
        match self.index_of(pos) {
            Some(at) => ring.push(at),
            None if radius == 1 => ring.push(TileRef::Border),
            None => {}
        }
    }

    /// Handle of the cell at `pos`, if it lies on the grid.
    pub fn index_of(&self, pos: Position) -> Option<TileRef> {
        if pos.y < 0 || pos.x < 0 || pos.y >= self.height || pos.x >= self.width {
            return None;
        }
        Some(TileRef::Cell((pos.y * self.width + pos.x) as usize))
    }

    pub fn tile_at(&self, y: i32, x: i32) -> Option<&Tile> {
        self.index_of(Position::new(y, x)).map(|at| self.tile(at))
    }

    pub fn tile(&self, at: TileRef) -> &Tile {
        match at {
            TileRef::Cell(index) => &self.tiles[index],
            TileRef::Border => &self.border,
        }
    }

    /// # Panics
    /// The border sentinel is immutable.
    fn tile_mut(&mut self, at: TileRef) -> &mut Tile {
        match at {
            TileRef::Cell(index) => &mut self.tiles[index],
            TileRef::Border => panic!("border tile is immutable"),
        }
    }

    pub fn ring(&self, at: TileRef, radius: usize) -> &[TileRef] {
        self.tile(at).ring(radius)
    }

    /// The eight adjacent tiles in compass slot order.
    pub fn neighbors(&self, at: TileRef) -> &[TileRef] {
        self.ring(at, 1)
    }

    /// Iterator over all cells, row by row
    pub fn tiles(&self) -> impl Iterator<Item = (TileRef, &Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| (TileRef::Cell(index), tile))
    }

    /// Top-of-stack entity of every cell.
    pub fn snapshot(&self) -> Vec<Vec<Option<&Entity>>> {
        self.tiles
            .chunks(self.width as usize)
            .map(|row| row.iter().map(Tile::top).collect())
            .collect()
    }

    /// Create an entity from `kind` and attach it to `at`.
    pub fn spawn(&mut self, kind: EntityKind, at: TileRef) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.attach(Entity::new(id, kind), at);
        id
    }

    /// Push `entity` onto the stack of `at` and record where it lives.
    ///
    /// # Panics
    /// If the entity is already attached somewhere.
    pub fn attach(&mut self, entity: Entity, at: TileRef) {
        let id = entity.id();
        if let Some(previous) = self.locations.insert(id, at) {
            panic!("entity {id} attached twice (already on {previous:?})");
        }
        self.tile_mut(at).push(entity);
    }

    /// Take an entity off its tile. Returns `None` for unattached ids.
    pub fn detach(&mut self, id: EntityId) -> Option<Entity> {
        let at = self.locations.remove(&id)?;
        let tile = self.tile_mut(at);
        let entity = match tile.top() {
            Some(top) if top.id() == id => tile.pop(),
            _ => tile.remove(id),
        };
        match entity {
            Some(entity) => Some(entity),
            None => panic!("entity {id} recorded on {at:?} but missing from its stack"),
        }
    }

    /// Move an attached entity onto the top of another tile.
    ///
    /// # Panics
    /// If the entity is not attached.
    pub fn relocate(&mut self, id: EntityId, to: TileRef) {
        match self.detach(id) {
            Some(entity) => self.attach(entity, to),
            None => panic!("cannot move unattached entity {id}"),
        }
    }

    pub fn location(&self, id: EntityId) -> Option<TileRef> {
        self.locations.get(&id).copied()
    }

    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.location(id).map(|at| self.tile(at).position())
    }

    pub fn is_attached(&self, id: EntityId) -> bool {
        self.locations.contains_key(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        let at = self.location(id)?;
        self.tile(at).entities().iter().find(|entity| entity.id() == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let at = self.location(id)?;
        self.tile_mut(at)
            .stack
            .iter_mut()
            .find(|entity| entity.id() == id)
    }

    /// Number of attached entities, the border sentinel excluded.
    pub fn population(&self) -> usize {
        self.locations.len()
    }

    /// All attached entities, row by row and bottom of stack first.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.tiles.iter().flat_map(|tile| tile.entities().iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evolife_core::{EcosystemConfig, StepAllowance};
    use proptest::prelude::*;

    fn empty_map(height: usize, width: usize) -> EntityMap {
        vec![vec![None; width]; height]
    }

    #[test]
    fn test_grid_creation() {
        let mut map = empty_map(3, 4);
        map[1][2] = Some(EntityKind::Water);
        let grid = Grid::build(map).unwrap();

        assert_eq!(grid.width, 4);
        assert_eq!(grid.height, 3);
        assert_eq!(grid.population(), 1);
        let tile = grid.tile_at(1, 2).unwrap();
        assert_eq!(tile.top().map(|e| e.species()), Some(Species::Water));
        assert!(grid.tile_at(3, 0).is_none());
        assert!(grid.tile_at(0, -1).is_none());
    }

    #[test]
    fn test_build_rejects_ragged_map() {
        let mut map = empty_map(3, 4);
        map[2].pop();
        assert!(matches!(Grid::build(map), Err(Error::InvalidMap(_))));
        assert!(matches!(Grid::build(Vec::new()), Err(Error::InvalidMap(_))));
    }

    #[test]
    fn test_ring_order_and_border() {
        let grid = Grid::build(empty_map(3, 3)).unwrap();
        let corner = grid.index_of(Position::new(0, 0)).unwrap();
        let ring = grid.neighbors(corner);

        assert_eq!(ring.len(), 8);
        let expected = [
            TileRef::Border,
            TileRef::Border,
            TileRef::Border,
            TileRef::Border,
            TileRef::Cell(1),
            TileRef::Border,
            TileRef::Cell(3),
            TileRef::Cell(4),
        ];
        assert_eq!(ring, expected);

        let border = grid.tile(TileRef::Border);
        assert_eq!(border.top().unwrap().step_allowance(), StepAllowance::Never);
        assert!(!border.is_walkable(0));
    }

    #[test]
    fn test_outer_rings_drop_off_grid_cells() {
        let grid = Grid::build(empty_map(5, 5)).unwrap();
        let center = grid.index_of(Position::new(2, 2)).unwrap();
        assert_eq!(grid.ring(center, 2).len(), 16);
        assert!(grid.ring(center, 3).is_empty());

        let corner = grid.index_of(Position::new(0, 0)).unwrap();
        let ring = grid.ring(corner, 2);
        let positions: Vec<Position> = ring.iter().map(|&at| grid.tile(at).position()).collect();
        assert_eq!(
            positions,
            vec![
                Position::new(0, 2),
                Position::new(1, 2),
                Position::new(2, 0),
                Position::new(2, 1),
                Position::new(2, 2),
            ]
        );
        assert!(grid.ring(corner, 0).is_empty());
        assert!(grid.ring(corner, RING_COUNT + 1).is_empty());
    }

    #[test]
    fn test_walkability() {
        let config = EcosystemConfig::default();
        let mut map = empty_map(1, 4);
        map[0][0] = Some(EntityKind::Beach);
        map[0][1] = Some(EntityKind::plant(&config, 1));
        map[0][2] = Some(EntityKind::Water);
        let grid = Grid::build(map).unwrap();

        assert!(grid.tile_at(0, 0).unwrap().is_walkable(2));
        assert!(grid.tile_at(0, 1).unwrap().is_walkable(1));
        assert!(!grid.tile_at(0, 1).unwrap().is_walkable(2));
        assert!(!grid.tile_at(0, 2).unwrap().is_walkable(0));
        assert!(grid.tile_at(0, 3).unwrap().is_walkable(2));
    }

    #[test]
    fn test_attach_detach_keep_stack_and_location_in_sync() {
        let config = EcosystemConfig::default();
        let mut map = empty_map(1, 2);
        map[0][0] = Some(EntityKind::Beach);
        let mut grid = Grid::build(map).unwrap();
        let beach = grid.tile_at(0, 0).unwrap().top().unwrap().id();

        let left = grid.index_of(Position::new(0, 0)).unwrap();
        let right = grid.index_of(Position::new(0, 1)).unwrap();
        let animal = grid.spawn(EntityKind::land_animal(&config, Species::Herbivore, 0), left);
        assert_eq!(grid.tile(left).entities().len(), 2);
        assert_eq!(grid.tile(left).top().unwrap().id(), animal);

        grid.relocate(animal, right);
        assert_eq!(grid.location(animal), Some(right));
        assert_eq!(grid.position_of(animal), Some(Position::new(0, 1)));
        assert_eq!(grid.tile(left).top().unwrap().id(), beach);

        // detaching from the bottom of a stack
        let animal_again = grid.spawn(EntityKind::land_animal(&config, Species::Herbivore, 0), left);
        let removed = grid.detach(beach).unwrap();
        assert_eq!(removed.species(), Species::Beach);
        assert_eq!(grid.tile(left).top().unwrap().id(), animal_again);
        assert!(grid.detach(beach).is_none());
        assert!(!grid.is_attached(beach));
    }

    #[test]
    #[should_panic]
    fn test_double_attach_panics() {
        let mut grid = Grid::build(empty_map(1, 2)).unwrap();
        let at = grid.index_of(Position::new(0, 0)).unwrap();
        let id = grid.spawn(EntityKind::Beach, at);
        let copy = grid.entity(id).unwrap().clone();
        grid.attach(copy, at);
    }

    #[test]
    fn test_snapshot_shows_top_of_stack() {
        let config = EcosystemConfig::default();
        let mut map = empty_map(2, 2);
        map[0][0] = Some(EntityKind::Beach);
        let mut grid = Grid::build(map).unwrap();
        let at = grid.index_of(Position::new(0, 0)).unwrap();
        let animal = grid.spawn(EntityKind::land_animal(&config, Species::Carnivore, 0), at);

        let snapshot = grid.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].len(), 2);
        assert_eq!(snapshot[0][0].map(|e| e.id()), Some(animal));
        assert!(snapshot[1][1].is_none());
    }

    #[test]
    fn test_find_by_species_and_stage() {
        let config = EcosystemConfig::default();
        let mut map = empty_map(1, 1);
        map[0][0] = Some(EntityKind::plant(&config, 1));
        let mut grid = Grid::build(map).unwrap();
        let at = grid.index_of(Position::new(0, 0)).unwrap();
        grid.spawn(EntityKind::land_animal(&config, Species::Herbivore, 0), at);

        let tile = grid.tile(at);
        assert!(tile.find(Species::Plant, Some(1)).is_some());
        assert!(tile.find(Species::Plant, Some(0)).is_none());
        assert!(tile.find(Species::Herbivore, Some(0)).is_some());
        assert_eq!(tile.vegetation().map(|e| e.species()), Some(Species::Plant));
        assert!(!tile.contains(Species::Protozoan));
    }

    proptest! {
        #[test]
        fn prop_adjacent_ring_always_has_eight_entries(
            height in 1usize..12,
            width in 1usize..12,
        ) {
            let grid = Grid::build(empty_map(height, width)).unwrap();
            for (at, tile) in grid.tiles() {
                let ring = grid.neighbors(at);
                prop_assert_eq!(ring.len(), 8);
                for (slot, dir) in evolife_core::Direction::all().into_iter().enumerate() {
                    let (dy, dx) = dir.to_delta();
                    let expected = grid
                        .index_of(tile.position().add(dy, dx))
                        .unwrap_or(TileRef::Border);
                    prop_assert_eq!(ring[slot], expected);
                }
                for radius in 2..=RING_COUNT {
                    for &member in grid.ring(at, radius) {
                        prop_assert_ne!(member, TileRef::Border);
                        let distance = grid.tile(member).position().ring_distance(&tile.position());
                        prop_assert_eq!(distance, radius as i32);
                    }
                }
            }
        }
    }
}
