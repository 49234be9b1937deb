//! Symbolic maps: one character per cell in, one character per cell out.

use crate::entity::{Entity, EntityKind, Occupant};
use crate::grid::EntityMap;
use evolife_core::{EcosystemConfig, Level, Species};

const HERBIVORE_TOKENS: [char; 3] = ['җ', 'Җ', 'Ӝ'];
const CARNIVORE_TOKENS: [char; 3] = ['ԅ', 'ԇ', 'ʡ'];
/// The last two both mark a fully grown plant; they alternate on display.
const PLANT_TOKENS: [char; 4] = ['ʷ', 'ʬ', 'Y', 'ϒ'];
const RAIN_FOREST_TOKENS: [char; 2] = ['Ϋ', 'ϔ'];
const WATER_TOKENS: [char; 2] = ['∽', '~'];
const PROTOZOAN_TOKEN: char = '§';
const BEACH_TOKEN: char = ':';
const EMPTY_TOKEN: char = ' ';

/// Translate a token map into an initial entity layout.
///
/// Animal and plant tokens encode the level by their position in the
/// token set. Characters outside the alphabet leave the cell empty. Lines
/// are not padded, so a ragged map is rejected later by the grid.
pub fn parse_map(text: &str, config: &EcosystemConfig) -> EntityMap {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| line.chars().map(|token| token_to_entity(token, config)).collect())
        .collect()
}

fn token_to_entity(token: char, config: &EcosystemConfig) -> Option<EntityKind> {
    let level_of = |tokens: &[char]| tokens.iter().position(|&t| t == token).map(|i| i as u8);

    if let Some(level) = level_of(&HERBIVORE_TOKENS) {
        return Some(EntityKind::land_animal(config, Species::Herbivore, level));
    }
    if let Some(level) = level_of(&CARNIVORE_TOKENS) {
        return Some(EntityKind::land_animal(config, Species::Carnivore, level));
    }
    if let Some(level) = level_of(&PLANT_TOKENS) {
        return Some(EntityKind::plant(config, level));
    }
    if RAIN_FOREST_TOKENS.contains(&token) {
        return Some(EntityKind::rain_forest());
    }
    if WATER_TOKENS.contains(&token) {
        return Some(EntityKind::Water);
    }
    match token {
        PROTOZOAN_TOKEN => Some(EntityKind::protozoan(config)),
        BEACH_TOKEN => Some(EntityKind::Beach),
        _ => None,
    }
}

/// Display token of an entity; `frame` drives the two-frame animation of
/// water, rainforests and fully grown plants.
pub fn glyph(entity: Option<&Entity>, frame: usize, config: &EcosystemConfig) -> char {
    let Some(entity) = entity else {
        return EMPTY_TOKEN;
    };
    let toggle = frame % 2;
    let stage = match entity.level() {
        Some(Level::Stage(stage)) => stage as usize,
        _ => 0,
    };

    match entity.species() {
        Species::Herbivore => HERBIVORE_TOKENS[stage.min(HERBIVORE_TOKENS.len() - 1)],
        Species::Carnivore => CARNIVORE_TOKENS[stage.min(CARNIVORE_TOKENS.len() - 1)],
        Species::Plant if stage >= config.plant.max_level as usize => PLANT_TOKENS[2 + toggle],
        Species::Plant => PLANT_TOKENS[stage],
        Species::RainForest => RAIN_FOREST_TOKENS[toggle],
        Species::Water => WATER_TOKENS[toggle],
        Species::Protozoan => PROTOZOAN_TOKEN,
        Species::Beach => BEACH_TOKEN,
        Species::Border => EMPTY_TOKEN,
    }
}

/// Render rows of top-of-stack entities as text, one line per row.
pub fn render(rows: &[Vec<Option<&Entity>>], frame: usize, config: &EcosystemConfig) -> String {
    let mut text = String::new();
    for row in rows {
        text.extend(row.iter().map(|&cell| glyph(cell, frame, config)));
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use evolife_core::EntityId;

    #[test]
    fn test_parse_map_tokens() {
        let config = EcosystemConfig::default();
        let map = parse_map("∽~:ʷ\nҖʡϔ§\n Y?ϒ\n", &config);

        assert_eq!(map.len(), 3);
        assert!(map.iter().all(|row| row.len() == 4));

        let species = |y: usize, x: usize| map[y][x].as_ref().map(|kind| kind.species());
        assert_eq!(species(0, 0), Some(Species::Water));
        assert_eq!(species(0, 1), Some(Species::Water));
        assert_eq!(species(0, 2), Some(Species::Beach));
        assert_eq!(species(1, 2), Some(Species::RainForest));
        assert_eq!(species(1, 3), Some(Species::Protozoan));
        assert_eq!(species(2, 0), None);
        assert_eq!(species(2, 2), None);

        let level = |y: usize, x: usize| map[y][x].as_ref().and_then(EntityKind::level);
        assert_eq!(level(0, 3), Some(Level::Stage(0)));
        assert_eq!(level(1, 0), Some(Level::Stage(1)));
        assert_eq!(species(1, 1), Some(Species::Carnivore));
        assert_eq!(level(1, 1), Some(Level::Stage(2)));
        assert_eq!(level(2, 1), Some(Level::Stage(2)));
        // the alternate grown-plant token clamps to the top level
        assert_eq!(level(2, 3), Some(Level::Stage(2)));
    }

    #[test]
    fn test_ragged_map_rejected_by_grid() {
        let config = EcosystemConfig::default();
        let map = parse_map("∽∽∽\n::\n", &config);
        assert!(Grid::build(map).is_err());
    }

    #[test]
    fn test_glyph_animation() {
        let config = EcosystemConfig::default();
        let water = Entity::new(EntityId(1), EntityKind::Water);
        let tree = Entity::new(EntityId(2), EntityKind::plant(&config, 2));
        let sprout = Entity::new(EntityId(3), EntityKind::plant(&config, 1));

        assert_eq!(glyph(Some(&water), 0, &config), '∽');
        assert_eq!(glyph(Some(&water), 1, &config), '~');
        assert_eq!(glyph(Some(&tree), 0, &config), 'Y');
        assert_eq!(glyph(Some(&tree), 1, &config), 'ϒ');
        assert_eq!(glyph(Some(&sprout), 1, &config), 'ʬ');
        assert_eq!(glyph(None, 0, &config), ' ');
    }

    #[test]
    fn test_render_reproduces_map() {
        let config = EcosystemConfig::default();
        let text = "∽:ʷ \nΫҖԅ§\n";
        let grid = Grid::build(parse_map(text, &config)).unwrap();

        assert_eq!(render(&grid.snapshot(), 0, &config), text);
        assert_eq!(render(&grid.snapshot(), 1, &config), "~:ʷ \nϔҖԅ§\n");
    }
}
