//! Entity model: species variants, per-instance state and capability traits.

use evolife_core::{
    EcosystemConfig, EntityId, LandAnimalConfig, Level, PlantConfig, ProtozoanConfig, Species,
    StepAllowance,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Something that can sit on a tile.
pub trait Occupant {
    fn species(&self) -> Species;

    /// Highest mover level tolerated on the same tile.
    fn step_allowance(&self) -> StepAllowance;
}

/// Something with a discrete maturity level.
pub trait Leveled {
    fn level(&self) -> Level;
}

/// Countdown until a vegetation entity plants a seedling next to itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Growth {
    pub ticks_to_reproduce: Option<u32>,
}

impl Growth {
    /// Advance the countdown by one tick.
    ///
    /// Returns `true` when a seedling should be planted now. Without room
    /// around the plant the countdown is discarded.
    pub fn advance<R: Rng>(&mut self, has_room: bool, range: (u32, u32), rng: &mut R) -> bool {
        if !has_room {
            self.ticks_to_reproduce = None;
            return false;
        }

        match self.ticks_to_reproduce {
            None => {
                self.ticks_to_reproduce = Some(rng.gen_range(range.0..=range.1));
                false
            }
            Some(ticks) if ticks <= 1 => {
                self.ticks_to_reproduce = None;
                true
            }
            Some(ticks) => {
                self.ticks_to_reproduce = Some(ticks - 1);
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protozoan {
    pub time_to_live: u32,
}

impl Protozoan {
    pub fn new(config: &ProtozoanConfig) -> Self {
        Self {
            time_to_live: config.time_to_live,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainForest {
    pub growth: Growth,
}

/// A plant; it grows through levels when enclosed by vegetation and shrinks
/// back when grazed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    level: u8,
    step_allowance: u8,
    pub health: i32,
    pub ticks_to_evolve: Option<u32>,
    pub growth: Growth,
}

impl Plant {
    pub fn new(config: &PlantConfig, level: u8) -> Self {
        let mut plant = Self {
            level: 0,
            step_allowance: 0,
            health: 0,
            ticks_to_evolve: None,
            growth: Growth::default(),
        };
        plant.set_level(config, level);
        plant
    }

    pub fn stage(&self) -> u8 {
        self.level
    }

    fn set_level(&mut self, config: &PlantConfig, level: u8) {
        self.level = level.min(config.max_level);
        self.step_allowance = config.max_level - self.level;
        self.health = config.health[self.level as usize];
        self.ticks_to_evolve = None;
    }

    /// Advance the evolution countdown by one tick.
    ///
    /// `enclosed` tells whether every adjacent tile holds a border or
    /// vegetation of at least this plant's level. Returns `true` when the
    /// plant leveled up this tick.
    pub fn advance_evolution<R: Rng>(
        &mut self,
        enclosed: bool,
        config: &PlantConfig,
        rng: &mut R,
    ) -> bool {
        if self.level >= config.max_level || !enclosed {
            self.ticks_to_evolve = None;
            return false;
        }

        match self.ticks_to_evolve {
            None => {
                let (low, high) = config.ticks_evo_range;
                self.ticks_to_evolve = Some(rng.gen_range(low..=high));
                false
            }
            Some(ticks) if ticks <= 1 => {
                self.set_level(config, self.level + 1);
                true
            }
            Some(ticks) => {
                self.ticks_to_evolve = Some(ticks - 1);
                false
            }
        }
    }

    /// Drop to the lowest level whose full health covers the remaining health.
    ///
    /// Health above every lower tier leaves the plant untouched.
    pub fn devolve(&mut self, config: &PlantConfig) {
        if let Some(level) =
            (0..config.max_level).find(|&lvl| self.health <= config.health[lvl as usize])
        {
            self.set_level(config, level);
        }
    }
}

/// State shared by herbivores and carnivores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandAnimal {
    level: u8,
    pub time_to_live: u32,
    pub energy: u32,
    pub food: u32,
    pub health: i32,
    pub attack: i32,
    pub view_range: usize,
    pub ready_to_mate: bool,
}

impl LandAnimal {
    pub fn new(config: &LandAnimalConfig, level: u8) -> Self {
        let level = level.min(config.max_level);
        let row = level as usize;
        Self {
            level,
            time_to_live: config.time_to_live[row],
            energy: config.energy[row],
            food: config.food[row],
            health: config.health[row],
            attack: config.attack[row],
            view_range: config.view_range[row],
            ready_to_mate: false,
        }
    }

    pub fn stage(&self) -> u8 {
        self.level
    }

    pub fn is_hungry(&self) -> bool {
        self.food == 0
    }
}

/// Tagged species variant with its per-instance state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Border,
    Beach,
    Water,
    Protozoan(Protozoan),
    RainForest(RainForest),
    Plant(Plant),
    Herbivore(LandAnimal),
    Carnivore(LandAnimal),
}

impl EntityKind {
    pub fn protozoan(config: &EcosystemConfig) -> Self {
        EntityKind::Protozoan(Protozoan::new(&config.protozoan))
    }

    pub fn rain_forest() -> Self {
        EntityKind::RainForest(RainForest::default())
    }

    pub fn plant(config: &EcosystemConfig, level: u8) -> Self {
        EntityKind::Plant(Plant::new(&config.plant, level))
    }

    /// # Panics
    /// If `species` is not a land animal.
    pub fn land_animal(config: &EcosystemConfig, species: Species, level: u8) -> Self {
        let animal = LandAnimal::new(config.land_animal(species), level);
        match species {
            Species::Herbivore => EntityKind::Herbivore(animal),
            Species::Carnivore => EntityKind::Carnivore(animal),
            other => panic!("{other} is not a land animal"),
        }
    }

    pub fn as_land_animal(&self) -> Option<&LandAnimal> {
        match self {
            EntityKind::Herbivore(animal) | EntityKind::Carnivore(animal) => Some(animal),
            _ => None,
        }
    }

    pub fn as_land_animal_mut(&mut self) -> Option<&mut LandAnimal> {
        match self {
            EntityKind::Herbivore(animal) | EntityKind::Carnivore(animal) => Some(animal),
            _ => None,
        }
    }

    pub fn as_plant(&self) -> Option<&Plant> {
        match self {
            EntityKind::Plant(plant) => Some(plant),
            _ => None,
        }
    }

    pub fn as_plant_mut(&mut self) -> Option<&mut Plant> {
        match self {
            EntityKind::Plant(plant) => Some(plant),
            _ => None,
        }
    }

    /// Discrete level, for species that have one.
    pub fn level(&self) -> Option<Level> {
        match self {
            EntityKind::RainForest(forest) => Some(forest.level()),
            EntityKind::Plant(plant) => Some(plant.level()),
            EntityKind::Herbivore(animal) | EntityKind::Carnivore(animal) => {
                Some(animal.level())
            }
            _ => None,
        }
    }

    /// Health pool a predator feeds on.
    pub fn health(&self) -> Option<i32> {
        match self {
            EntityKind::Plant(plant) => Some(plant.health),
            EntityKind::Herbivore(animal) | EntityKind::Carnivore(animal) => Some(animal.health),
            _ => None,
        }
    }

    /// Subtract `damage` from the health pool and return what is left.
    pub fn wound(&mut self, damage: i32) -> Option<i32> {
        let health = match self {
            EntityKind::Plant(plant) => &mut plant.health,
            EntityKind::Herbivore(animal) | EntityKind::Carnivore(animal) => &mut animal.health,
            _ => return None,
        };
        *health -= damage;
        Some(*health)
    }
}

impl Occupant for EntityKind {
    fn species(&self) -> Species {
        match self {
            EntityKind::Border => Species::Border,
            EntityKind::Beach => Species::Beach,
            EntityKind::Water => Species::Water,
            EntityKind::Protozoan(_) => Species::Protozoan,
            EntityKind::RainForest(_) => Species::RainForest,
            EntityKind::Plant(_) => Species::Plant,
            EntityKind::Herbivore(_) => Species::Herbivore,
            EntityKind::Carnivore(_) => Species::Carnivore,
        }
    }

    fn step_allowance(&self) -> StepAllowance {
        match self {
            EntityKind::Beach => StepAllowance::Always,
            EntityKind::Plant(plant) => StepAllowance::Finite(plant.step_allowance),
            _ => StepAllowance::Never,
        }
    }
}

impl Leveled for RainForest {
    fn level(&self) -> Level {
        Level::Maximal
    }
}

impl Leveled for Plant {
    fn level(&self) -> Level {
        Level::Stage(self.level)
    }
}

impl Leveled for LandAnimal {
    fn level(&self) -> Level {
        Level::Stage(self.level)
    }
}

/// An entity instance attached to the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    pub fn level(&self) -> Option<Level> {
        self.kind.level()
    }

    /// Inspector view of the entity.
    pub fn stats(&self) -> EntityStats {
        let mut stats = EntityStats {
            id: self.id,
            species: self.species(),
            level: self.level(),
            health: self.kind.health(),
            attack: None,
            energy: None,
            food: None,
            time_to_live: None,
            ready_to_mate: None,
        };

        match &self.kind {
            EntityKind::Protozoan(protozoan) => {
                stats.time_to_live = Some(protozoan.time_to_live);
            }
            EntityKind::Herbivore(animal) | EntityKind::Carnivore(animal) => {
                stats.attack = Some(animal.attack);
                stats.energy = Some(animal.energy);
                stats.food = Some(animal.food);
                stats.time_to_live = Some(animal.time_to_live);
                stats.ready_to_mate = Some(animal.ready_to_mate);
            }
            _ => {}
        }

        stats
    }
}

impl Occupant for Entity {
    fn species(&self) -> Species {
        self.kind.species()
    }

    fn step_allowance(&self) -> StepAllowance {
        self.kind.step_allowance()
    }
}

/// Generic stat fields of an entity, for display and inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    pub id: EntityId,
    pub species: Species,
    pub level: Option<Level>,
    pub health: Option<i32>,
    pub attack: Option<i32>,
    pub energy: Option<u32>,
    pub food: Option<u32>,
    pub time_to_live: Option<u32>,
    pub ready_to_mate: Option<bool>,
}
