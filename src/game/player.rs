use rand::Rng;

use crate::config::STARTING_MASS;
use crate::game::entity::{Color, EntityId};

pub type PlayerId = u64;

const PALETTE: [Color; 15] = [
    Color::new(0xFF, 0x41, 0x36),
    Color::new(0xFF, 0x6B, 0x35),
    Color::new(0xFF, 0xDC, 0x00),
    Color::new(0x2E, 0xCC, 0x40),
    Color::new(0x00, 0x74, 0xD9),
    Color::new(0x7F, 0xDB, 0xFF),
    Color::new(0xB1, 0x0D, 0xC9),
    Color::new(0xF0, 0x12, 0xBE),
    Color::new(0xFF, 0x69, 0xB4),
    Color::new(0x01, 0xFF, 0x70),
    Color::new(0x3D, 0x99, 0x70),
    Color::new(0x39, 0xCC, 0xCC),
    Color::new(0xE6, 0x51, 0x00),
    Color::new(0x00, 0xBC, 0xD4),
    Color::new(0x8B, 0xC3, 0x4A),
];

/// Owner record. Cells refer to it by id only.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub skin: String,
    pub color: Color,
    pub cells: Vec<EntityId>,
    pub score: u64,
}

impl Player {
    pub fn new<R: Rng + ?Sized>(id: PlayerId, name: String, skin: String, rng: &mut R) -> Self {
        Player {
            id,
            name,
            skin,
            color: PALETTE[rng.gen_range(0..PALETTE.len())],
            cells: Vec::new(),
            score: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn can_split(&self, max_cells: usize) -> bool {
        self.cells.len() < max_cells
    }

    pub fn viewport_scale(total_mass: f64) -> f64 {
        (total_mass / STARTING_MASS).sqrt().max(1.0)
    }

    pub fn update_score(&mut self, total_mass: f64) {
        let mass = total_mass as u64;
        if mass > self.score {
            self.score = mass;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn score_only_rises() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut p = Player::new(1, "p".into(), String::new(), &mut rng);
        p.update_score(120.7);
        p.update_score(40.0);
        assert_eq!(p.score, 120);
    }

    #[test]
    fn viewport_never_shrinks_below_one() {
        assert_eq!(Player::viewport_scale(1.0), 1.0);
        assert_eq!(Player::viewport_scale(STARTING_MASS * 4.0), 2.0);
    }
}
