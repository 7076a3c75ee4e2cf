use std::f64::consts::TAU;

use rand::Rng;
use tracing::debug;

use crate::game::entity::Entity;
use crate::game::world::CellWorld;

impl Entity {
    /// Grow by `delta`. Crossing the per-cell mass cap splits the cell in two
    /// while the owner is under the cell limit; otherwise the mass is clamped.
    pub fn add_mass(&mut self, delta: f64, world: &mut dyn CellWorld) {
        let total = self.mass + delta;
        if !(total > 0.0) {
            debug!(cell = self.id(), delta, "ignoring mass change that would empty the cell");
            return;
        }

        let cap = world.config().max_mass_per_player;
        let max_cells = world.config().max_cells_per_player;

        if total > cap {
            let splittable = self
                .owner()
                .filter(|&owner| world.owner_cell_count(owner) < max_cells);
            if let Some(owner) = splittable {
                let half = total / 2.0;
                let angle = world.rng().gen_range(0.0..TAU);
                let speed = world.config().split_push_speed;
                if let Some(sibling) = world.spawn_split_entity(owner, self, angle, half, speed) {
                    self.mass = half;
                    debug!(cell = self.id(), sibling, mass = half, "mass cap split");
                    return;
                }
                debug!(cell = self.id(), owner, "split sibling not spawned, clamping");
            }
        }

        self.mass = total.min(cap);
    }
}
