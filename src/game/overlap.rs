use crate::config::EJECT_OVERLAP_SLACK;
use crate::game::border::{self, Bounds};
use crate::game::entity::Entity;
use crate::game::physics::{distance, heading, simple_collide};
use crate::game::world::CellWorld;

impl Entity {
    /// Push apart every free-floating mass overlapping this one when it is
    /// placed at `(x1, y1)`. Partners move right away; the returned offset is
    /// this cell's share, applied by the caller.
    pub fn resolve_overlaps(&mut self, x1: f64, y1: f64, world: &mut dyn CellWorld) -> (f64, f64) {
        let collision_distance = self.radius() * 2.0 - EJECT_OVERLAP_SLACK;
        let bounds = Bounds::from(world.config());
        let (mut xd, mut yd) = (0.0, 0.0);

        for id in world.free_mass_ids() {
            if id == self.id() {
                continue;
            }
            let Some(other) = world.entity_mut(id) else {
                continue;
            };
            if !simple_collide(x1, y1, other.position, collision_distance) {
                continue;
            }
            let dist = distance(x1, y1, other.position.x, other.position.y);
            if dist >= collision_distance {
                continue;
            }

            let normal = (other.position.x - x1).atan2(other.position.y - y1);
            let push = (collision_distance - dist + EJECT_OVERLAP_SLACK) / 2.0;
            let (sin, cos) = heading(normal);
            let (xmove, ymove) = (push * sin, push * cos);

            other.position.x += xmove.trunc();
            other.position.y += ymove.trunc();
            other.position = border::clamp(other.position, bounds);
            xd -= xmove;
            yd -= ymove;

            // Idle partners get one more tick so the pair is checked again.
            let rearm = other.is_idle();
            if rearm {
                other.set_move_engine(0.0, 1, None);
            }
            world.reindex(id);
            if rearm {
                world.register_moving(id);
            }
            if self.is_idle() {
                self.set_move_engine(0.0, 1, None);
            }
        }

        (xd, yd)
    }
}
