//! Per-species live lists driving the scheduler.

use crate::entity::Occupant;
use crate::grid::Grid;
use evolife_core::{EntityId, Species};
use std::collections::HashSet;

/// Ids of the live entities of every species, in acting order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    lists: [Vec<EntityId>; Species::COUNT],
}

impl Roster {
    /// Collect every entity on the grid cells, row by row. The border
    /// sentinel lives outside the cells and is never listed.
    pub fn index(grid: &Grid) -> Self {
        let mut roster = Self::default();
        for entity in grid.entities() {
            roster.push(entity.species(), entity.id());
        }
        roster
    }

    pub fn list(&self, species: Species) -> &[EntityId] {
        &self.lists[species.index()]
    }

    pub fn set(&mut self, species: Species, ids: Vec<EntityId>) {
        self.lists[species.index()] = ids;
    }

    pub fn push(&mut self, species: Species, id: EntityId) {
        self.lists[species.index()].push(id);
    }

    /// Take the list out, leaving it empty.
    pub fn take(&mut self, species: Species) -> Vec<EntityId> {
        std::mem::take(&mut self.lists[species.index()])
    }

    /// Drop every id of `removed` from the list of `species`.
    pub fn remove_all(&mut self, species: Species, removed: &[EntityId]) {
        if removed.is_empty() {
            return;
        }
        let removed: HashSet<EntityId> = removed.iter().copied().collect();
        self.lists[species.index()].retain(|id| !removed.contains(id));
    }

    pub fn len(&self, species: Species) -> usize {
        self.lists[species.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    /// Every listed id with its species.
    pub fn iter(&self) -> impl Iterator<Item = (Species, EntityId)> + '_ {
        Species::all()
            .into_iter()
            .flat_map(move |species| self.list(species).iter().map(move |&id| (species, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use evolife_core::EcosystemConfig;

    #[test]
    fn test_index_follows_grid_order() {
        let config = EcosystemConfig::default();
        let map = vec![
            vec![Some(EntityKind::Water), Some(EntityKind::plant(&config, 0))],
            vec![Some(EntityKind::plant(&config, 1)), Some(EntityKind::Water)],
        ];
        let grid = Grid::build(map).unwrap();
        let roster = Roster::index(&grid);

        assert_eq!(roster.len(Species::Water), 2);
        assert_eq!(roster.len(Species::Plant), 2);
        assert_eq!(roster.len(Species::Border), 0);
        let plants = roster.list(Species::Plant);
        assert_eq!(grid.position_of(plants[0]).unwrap().y, 0);
        assert_eq!(grid.position_of(plants[1]).unwrap().y, 1);
        assert_eq!(roster.iter().count(), 4);
    }

    #[test]
    fn test_remove_and_take() {
        let mut roster = Roster::default();
        for raw in 1..=4 {
            roster.push(Species::Herbivore, EntityId(raw));
        }
        roster.remove_all(Species::Herbivore, &[EntityId(2), EntityId(9)]);
        assert_eq!(
            roster.list(Species::Herbivore),
            &[EntityId(1), EntityId(3), EntityId(4)]
        );

        let taken = roster.take(Species::Herbivore);
        assert_eq!(taken.len(), 3);
        assert!(roster.is_empty());
    }
}
