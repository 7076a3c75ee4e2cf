use crate::game::border::{self, Bounds};
use crate::game::entity::{CellKind, Entity, EntityId};
use crate::game::physics::{heading, outweighs, BoundingBox, Position};
use crate::game::world::CellWorld;

/// Cumulative travel distances for one tick, each at most `step` past the
/// previous one and ending exactly at `total`. Always yields at least once.
#[derive(Debug, Clone)]
pub struct SubSteps {
    total: f64,
    step: f64,
    travelled: f64,
    finished: bool,
}

impl SubSteps {
    pub fn new(total: f64, step: f64) -> Self {
        SubSteps {
            total,
            step,
            travelled: 0.0,
            finished: false,
        }
    }
}

impl Iterator for SubSteps {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.finished {
            return None;
        }
        self.travelled = (self.travelled + self.step).min(self.total);
        self.finished = !(self.travelled < self.total);
        Some(self.travelled)
    }
}

impl Entity {
    /// Run one tick of the move engine: decay, sub-stepped travel with
    /// per-kind interaction, border bounce and a truncated commit.
    pub fn advance(&mut self, world: &mut dyn CellWorld) {
        if self.is_idle() && self.movement.speed == 0.0 {
            return;
        }

        let speed = self.movement.speed;
        self.movement.speed *= self.movement.decay;
        self.movement.ticks = self.movement.ticks.saturating_sub(1);

        let (sin, cos) = heading(self.angle);
        let origin = self.position;
        // Never move further than one radius between interaction checks.
        let step = self.radius();

        let destination = match self.kind() {
            CellKind::PlayerCell => {
                for travelled in SubSteps::new(speed, step) {
                    self.position = Position::new(origin.x + travelled * sin, origin.y + travelled * cos);
                    self.consume_overlapping(world);
                    self.position = origin;
                }
                Position::new(origin.x + speed * sin, origin.y + speed * cos)
            }
            CellKind::EjectedMass => {
                let (mut xd, mut yd) = (0.0, 0.0);
                for travelled in SubSteps::new(speed, step) {
                    let x1 = origin.x + travelled * sin + xd;
                    let y1 = origin.y + travelled * cos + yd;
                    let (dx, dy) = self.resolve_overlaps(x1, y1, world);
                    xd += dx;
                    yd += dy;
                }
                Position::new(origin.x + speed * sin + xd, origin.y + speed * cos + yd)
            }
            _ => Position::new(origin.x + speed * sin, origin.y + speed * cos),
        };

        let bounced = border::reflect(destination, self.angle, Bounds::from(world.config()));
        self.angle = bounced.angle;
        self.commit_position(bounced.position);
    }

    /// Eat every clearly smaller cell that lies inside this one at its
    /// current position. Returns how many were eaten.
    pub fn consume_overlapping(&mut self, world: &mut dyn CellWorld) -> usize {
        let region = BoundingBox::around(self.position, self.radius());
        let prey: Vec<EntityId> = world
            .query(&region)
            .into_iter()
            .filter(|&id| id != self.id())
            .filter(|&id| world.entity(id).is_some_and(|other| self.can_consume(other)))
            .collect();

        let mut eaten = 0;
        for id in prey {
            let Some(mut victim) = world.take_entity(id) else {
                continue;
            };
            victim.on_consume(self, world);
            victim.set_killer(self.id());
            world.remove_entity(victim);
            eaten += 1;
        }
        eaten
    }

    fn can_consume(&self, other: &Entity) -> bool {
        if !other.kind().is_edible() {
            return false;
        }
        if self.owner().is_some() && self.owner() == other.owner() {
            return false;
        }
        outweighs(self.mass, other.mass) && other.collision_check2(self.square_size(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::world::World;

    fn world() -> World {
        World::new(GameConfig {
            border_right: 2000.0,
            border_bottom: 2000.0,
            food_count: 0,
            virus_count: 0,
            rng_seed: Some(11),
            ..GameConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn sub_steps_never_exceed_step() {
        for (total, step) in [(0.0, 10.0), (9.0, 10.0), (10.0, 10.0), (95.5, 10.0), (480.0, 32.0)] {
            let steps: Vec<f64> = SubSteps::new(total, step).collect();
            assert!(!steps.is_empty());
            assert_eq!(*steps.last().unwrap(), total);
            let mut previous = 0.0;
            for s in steps {
                assert!(s - previous <= step);
                previous = s;
            }
        }
    }

    #[test]
    fn zero_speed_still_checks_once() {
        assert_eq!(SubSteps::new(0.0, 5.0).collect::<Vec<_>>(), vec![0.0]);
    }

    #[test]
    fn decay_and_tick_countdown() {
        let mut world = world();
        let id = world.spawn(CellKind::Virus, None, Position::new(1000.0, 1000.0), 100.0);
        let mut cell = world.take_entity(id).unwrap();
        cell.set_angle(0.0);
        cell.set_move_engine(40.0, 2, Some(0.5));

        cell.advance(&mut world);
        assert_eq!(cell.position(), Position::new(1000.0, 1040.0));
        assert_eq!(cell.movement().speed, 20.0);
        assert_eq!(cell.movement().ticks, 1);

        cell.advance(&mut world);
        assert_eq!(cell.position(), Position::new(1000.0, 1060.0));
        assert_eq!(cell.movement().ticks, 0);
    }

    #[test]
    fn commit_truncates_fraction() {
        let mut world = world();
        let id = world.spawn(CellKind::Virus, None, Position::new(1000.0, 1000.0), 100.0);
        let mut cell = world.take_entity(id).unwrap();
        cell.set_angle(std::f64::consts::FRAC_PI_4);
        cell.set_move_engine(10.0, 1, None);
        cell.advance(&mut world);
        // 10 * sin(pi/4) = 7.07
        assert_eq!(cell.position(), Position::new(1007.0, 1007.0));
    }

    #[test]
    fn idle_cell_does_not_move() {
        let mut world = world();
        let id = world.spawn(CellKind::Food, None, Position::new(10.5, 10.5), 1.0);
        let mut cell = world.take_entity(id).unwrap();
        cell.advance(&mut world);
        assert_eq!(cell.position(), Position::new(10.5, 10.5));
        assert_eq!(cell.movement().ticks, 0);
    }

    #[test]
    fn fast_cell_eats_food_it_passes_over() {
        let mut world = world();
        let player = world.add_player("dash", "");
        let id = world.player_cells(player)[0];
        let food = world.spawn(CellKind::Food, None, Position::new(1000.0, 1150.0), 1.0);

        let mut cell = world.take_entity(id).unwrap();
        cell.set_position(Position::new(1000.0, 1000.0));
        cell.set_angle(0.0);
        // radius 32, travels 400 in one tick: food is neither at start nor end
        cell.set_move_engine(400.0, 1, None);
        cell.advance(&mut world);
        world.restore_entity(cell);

        assert!(world.entity(food).is_none());
        assert_eq!(world.entity(id).unwrap().position(), Position::new(1000.0, 1400.0));
        assert_eq!(world.entity(id).unwrap().mass(), 11.0);
        let kill = world.kills().last().unwrap();
        assert_eq!((kill.victim, kill.killer), (food, id));
    }

    #[test]
    fn siblings_and_bigger_cells_are_left_alone() {
        let mut world = world();
        let player = world.add_player("solo", "");
        let id = world.player_cells(player)[0];
        let big = world.spawn(CellKind::Virus, None, Position::new(1000.0, 1000.0), 100.0);
        let sibling = world.spawn(CellKind::PlayerCell, Some(player), Position::new(1000.0, 1000.0), 1.0);

        let mut cell = world.take_entity(id).unwrap();
        cell.set_position(Position::new(1000.0, 1000.0));
        assert_eq!(cell.consume_overlapping(&mut world), 0);
        world.restore_entity(cell);
        assert!(world.entity(big).is_some());
        assert!(world.entity(sibling).is_some());
    }
}
