//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entity living in the grid.
///
/// Ids are handed out by the grid when an entity is attached for the first
/// time and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Row-major position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub y: i32,
    pub x: i32,
}

impl Position {
    pub fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }

    pub fn add(&self, dy: i32, dx: i32) -> Self {
        Self {
            y: self.y + dy,
            x: self.x + dx,
        }
    }

    /// Chebyshev distance, i.e. the index of the square ring `other` lies on.
    pub fn ring_distance(&self, other: &Position) -> i32 {
        (self.y - other.y).abs().max((self.x - other.x).abs())
    }
}

/// Compass direction of a step into the adjacent ring.
///
/// The discriminant is the slot of the neighbor in a tile's radius-1 ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    NorthWest = 0,
    North = 1,
    NorthEast = 2,
    West = 3,
    East = 4,
    SouthWest = 5,
    South = 6,
    SouthEast = 7,
}

impl Direction {
    /// Row delta first, then column delta.
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::NorthWest => (-1, -1),
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::West => (0, -1),
            Direction::East => (0, 1),
            Direction::SouthWest => (1, -1),
            Direction::South => (1, 0),
            Direction::SouthEast => (1, 1),
        }
    }

    pub fn all() -> [Direction; 8] {
        [
            Direction::NorthWest,
            Direction::North,
            Direction::NorthEast,
            Direction::West,
            Direction::East,
            Direction::SouthWest,
            Direction::South,
            Direction::SouthEast,
        ]
    }

    pub fn slot(self) -> usize {
        self as usize
    }

    /// Direction of the first step from `from` toward `to`.
    ///
    /// Only the signs of the deltas matter. Returns `None` when both
    /// positions coincide.
    pub fn toward(from: Position, to: Position) -> Option<Direction> {
        let dy = (to.y - from.y).signum();
        let dx = (to.x - from.x).signum();
        Direction::all()
            .into_iter()
            .find(|dir| dir.to_delta() == (dy, dx))
    }
}

/// Closed set of species living in the ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Border,
    Beach,
    Water,
    Protozoan,
    RainForest,
    Plant,
    Herbivore,
    Carnivore,
}

impl Species {
    pub const COUNT: usize = 8;

    pub fn all() -> [Species; Species::COUNT] {
        [
            Species::Border,
            Species::Beach,
            Species::Water,
            Species::Protozoan,
            Species::RainForest,
            Species::Plant,
            Species::Herbivore,
            Species::Carnivore,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Border => "Border",
            Species::Beach => "Beach",
            Species::Water => "Water",
            Species::Protozoan => "Protozoan",
            Species::RainForest => "RainForest",
            Species::Plant => "Plant",
            Species::Herbivore => "Herbivore",
            Species::Carnivore => "Carnivore",
        }
    }

    pub fn is_vegetation(self) -> bool {
        matches!(self, Species::RainForest | Species::Plant)
    }

    pub fn is_land_animal(self) -> bool {
        matches!(self, Species::Herbivore | Species::Carnivore)
    }

    /// Species a land animal hunts.
    pub fn prey(self) -> Option<Species> {
        match self {
            Species::Herbivore => Some(Species::Plant),
            Species::Carnivore => Some(Species::Herbivore),
            _ => None,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Discrete maturity of an entity.
///
/// `Maximal` ranks above every stage; rainforests carry it so that they
/// always count as "equal or higher" vegetation around an evolving plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Stage(u8),
    Maximal,
}

impl Level {
    pub fn stage(self) -> Option<u8> {
        match self {
            Level::Stage(stage) => Some(stage),
            Level::Maximal => None,
        }
    }
}

/// Highest mover level an occupant tolerates on its tile.
///
/// Ordered `Never < Finite(_) < Always`, so borders and water block every
/// mover while beaches block none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepAllowance {
    Never,
    Finite(u8),
    Always,
}

impl StepAllowance {
    /// Whether a mover of `level` may share the tile with this occupant.
    pub fn permits(self, level: u8) -> bool {
        self >= StepAllowance::Finite(level)
    }
}
