//! Ecosystem simulation engine.
//!
//! A closed 2D world of stacked tiles where water spawns protozoa, protozoa
//! crawl ashore as herbivores or carnivores, plants spread and grow, and the
//! animals hunt, breed and die. The scheduler advances everything one tick
//! at a time in a fixed species order.

pub mod behavior;
pub mod entity;
pub mod grid;
pub mod map;
pub mod roster;
pub mod simulation;

pub use behavior::ActionResult;
pub use entity::{Entity, EntityKind, EntityStats, Leveled, Occupant};
pub use grid::{EntityMap, Grid, Tile, TileRef};
pub use map::{glyph, parse_map, render};
pub use simulation::{Population, Simulation, SimulationSummary};
