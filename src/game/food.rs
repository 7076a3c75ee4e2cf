use rand::Rng;

use crate::config::{GameConfig, BORDER_BOUNCE_MARGIN};
use crate::game::entity::{CellKind, Color, Entity, EntityId};
use crate::game::physics::Position;

const FOOD_COLORS: [Color; 10] = [
    Color::new(0xFF, 0x63, 0x84),
    Color::new(0x36, 0xA2, 0xEB),
    Color::new(0xFF, 0xCE, 0x56),
    Color::new(0x4B, 0xC0, 0xC0),
    Color::new(0x99, 0x66, 0xFF),
    Color::new(0xFF, 0x9F, 0x40),
    Color::new(0xE7, 0xE9, 0xED),
    Color::new(0x7C, 0xB3, 0x42),
    Color::new(0xF0, 0x62, 0x92),
    Color::new(0x4D, 0xD0, 0xE1),
];

/// Uniform position at least `margin` away from every border.
pub fn random_position<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R, margin: f64) -> Position {
    Position::new(
        rng.gen_range(config.border_left + margin..config.border_right - margin),
        rng.gen_range(config.border_top + margin..config.border_bottom - margin),
    )
    .truncated()
}

pub fn food<R: Rng + ?Sized>(id: EntityId, config: &GameConfig, rng: &mut R) -> Entity {
    let position = random_position(config, rng, BORDER_BOUNCE_MARGIN);
    let mut cell = Entity::new(id, CellKind::Food, None, position, config.food_mass, rng);
    cell.set_color(FOOD_COLORS[rng.gen_range(0..FOOD_COLORS.len())]);
    cell
}

pub fn virus<R: Rng + ?Sized>(id: EntityId, config: &GameConfig, rng: &mut R) -> Entity {
    let position = random_position(config, rng, config.virus_spawn_margin());
    Entity::new(id, CellKind::Virus, None, position, config.virus_mass, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn spawns_stay_inside_bounce_margin() {
        let config = GameConfig::default();
        let mut rng = SmallRng::seed_from_u64(21);
        for id in 0..200 {
            for cell in [food(id, &config, &mut rng), virus(id, &config, &mut rng)] {
                let p = cell.position();
                assert!(p.x >= config.border_left + BORDER_BOUNCE_MARGIN);
                assert!(p.x <= config.border_right - BORDER_BOUNCE_MARGIN);
                assert!(p.y >= config.border_top + BORDER_BOUNCE_MARGIN);
                assert!(p.y <= config.border_bottom - BORDER_BOUNCE_MARGIN);
            }
        }
    }

    #[test]
    fn kinds_and_masses() {
        let config = GameConfig::default();
        let mut rng = SmallRng::seed_from_u64(2);
        let f = food(1, &config, &mut rng);
        assert_eq!((f.kind(), f.mass()), (CellKind::Food, config.food_mass));
        let v = virus(2, &config, &mut rng);
        assert_eq!((v.kind(), v.mass()), (CellKind::Virus, config.virus_mass));
    }
}
