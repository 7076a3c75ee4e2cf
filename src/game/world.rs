use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, trace};

use crate::config::{ConfigError, GameConfig, PLAYER_SPAWN_MARGIN};
use crate::game::entity::{CellKind, Entity, EntityId};
use crate::game::food;
use crate::game::index::GridIndex;
use crate::game::physics::{heading, BoundingBox, Position};
use crate::game::player::{Player, PlayerId};

/// Everything a cell needs from the world while it moves, grows or is eaten.
///
/// A cell being advanced is detached from the registry first, so lookups by
/// its own id return `None` for the duration of the call.
pub trait CellWorld {
    fn config(&self) -> &GameConfig;
    fn rng(&mut self) -> &mut SmallRng;

    /// Cells whose centre lies inside `region`. Removed cells never appear.
    fn query(&self, region: &BoundingBox) -> Vec<EntityId>;
    fn entity(&self, id: EntityId) -> Option<&Entity>;
    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity>;
    /// Refresh the spatial index after a cell was moved in place.
    fn reindex(&mut self, id: EntityId);

    /// Detach a cell from the registry and the index without running hooks.
    fn take_entity(&mut self, id: EntityId) -> Option<Entity>;
    /// Finish removing a detached cell.
    fn remove_entity(&mut self, entity: Entity);
    fn register_moving(&mut self, id: EntityId);
    fn free_mass_ids(&self) -> Vec<EntityId>;

    fn owner(&self, id: PlayerId) -> Option<&Player>;
    fn owner_cell_count(&self, id: PlayerId) -> usize;
    fn attach_cell(&mut self, owner: PlayerId, cell: EntityId);
    fn detach_cell(&mut self, owner: PlayerId, cell: EntityId);
    fn track_free_mass(&mut self, cell: EntityId);
    fn untrack_free_mass(&mut self, cell: EntityId);

    /// Spawn a sibling of `parent` pushed away at `angle` with `speed`.
    fn spawn_split_entity(
        &mut self,
        owner: PlayerId,
        parent: &Entity,
        angle: f64,
        mass: f64,
        speed: f64,
    ) -> Option<EntityId>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kill {
    pub victim: EntityId,
    pub victim_kind: CellKind,
    pub victim_owner: Option<PlayerId>,
    pub killer: EntityId,
    pub tick: u64,
}

pub struct World {
    config: GameConfig,
    rng: SmallRng,
    cells: BTreeMap<EntityId, Entity>,
    index: GridIndex,
    players: BTreeMap<PlayerId, Player>,
    moving: Vec<EntityId>,
    free_mass: Vec<EntityId>,
    kills: Vec<Kill>,
    obituaries: BTreeMap<PlayerId, String>,
    food_live: usize,
    next_entity_id: EntityId,
    next_player_id: PlayerId,
    tick_count: u64,
}

impl World {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = config.seeded_rng();
        let index = GridIndex::new(config.index_cell_size);
        Ok(World {
            config,
            rng,
            cells: BTreeMap::new(),
            index,
            players: BTreeMap::new(),
            moving: Vec::new(),
            free_mass: Vec::new(),
            kills: Vec::new(),
            obituaries: BTreeMap::new(),
            food_live: 0,
            next_entity_id: 1,
            next_player_id: 1,
            tick_count: 0,
        })
    }

    /// Seed the configured amount of food and viruses.
    pub fn populate(&mut self) {
        self.replenish_food();
        for _ in 0..self.config.virus_count {
            let id = self.next_id();
            let virus = food::virus(id, &self.config, &mut self.rng);
            self.add_entity(virus);
        }
        debug!(cells = self.cells.len(), "world populated");
    }

    fn next_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn cells(&self) -> impl Iterator<Item = &Entity> {
        self.cells.values()
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_cells(&self, id: PlayerId) -> Vec<EntityId> {
        self.players.get(&id).map(|p| p.cells.clone()).unwrap_or_default()
    }

    pub fn moving_ids(&self) -> &[EntityId] {
        &self.moving
    }

    pub fn kills(&self) -> &[Kill] {
        &self.kills
    }

    pub fn drain_kills(&mut self) -> Vec<Kill> {
        std::mem::take(&mut self.kills)
    }

    pub fn random_angle(&mut self) -> f64 {
        self.rng.gen_range(0.0..std::f64::consts::TAU)
    }

    /// Insert a freshly built cell and run its `on_add` hook.
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        entity.on_add(self);
        if entity.kind() == CellKind::Food {
            self.food_live += 1;
        }
        let moving = entity.is_moving();
        self.restore_entity(entity);
        if moving {
            self.register_moving(id);
        }
        id
    }

    /// Build and insert a cell of `kind`.
    pub fn spawn(&mut self, kind: CellKind, owner: Option<PlayerId>, position: Position, mass: f64) -> EntityId {
        let id = self.next_id();
        let entity = Entity::new(id, kind, owner, position, mass, &mut self.rng);
        self.add_entity(entity)
    }

    /// Put a detached cell back into the registry and the index.
    pub fn restore_entity(&mut self, entity: Entity) {
        self.index.insert(entity.id(), entity.position());
        self.cells.insert(entity.id(), entity);
    }

    pub fn add_player(&mut self, name: impl Into<String>, skin: impl Into<String>) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;

        let player = Player::new(id, name.into(), skin.into(), &mut self.rng);
        let color = player.color;
        self.players.insert(id, player);

        let position = food::random_position(&self.config, &mut self.rng, PLAYER_SPAWN_MARGIN);
        let cell = self.spawn(CellKind::PlayerCell, Some(id), position, self.config.starting_mass);
        if let Some(cell) = self.cells.get_mut(&cell) {
            cell.set_color(color);
        }
        debug!(player = id, "player joined");
        id
    }

    pub fn remove_player(&mut self, id: PlayerId) {
        for cell in self.player_cells(id) {
            if let Some(entity) = self.take_entity(cell) {
                self.remove_entity(entity);
            }
        }
        self.players.remove(&id);
        self.obituaries.remove(&id);
        debug!(player = id, "player left");
    }

    /// Total mass and mass-weighted centre of a player's cells.
    pub fn player_mass_center(&self, id: PlayerId) -> Option<(f64, Position)> {
        let player = self.players.get(&id)?;
        let cells: Vec<&Entity> = player.cells.iter().filter_map(|c| self.cells.get(c)).collect();
        let total: f64 = cells.iter().map(|c| c.mass()).sum();
        if cells.is_empty() || total <= 0.0 {
            return None;
        }
        let x = cells.iter().map(|c| c.position().x * c.mass()).sum::<f64>() / total;
        let y = cells.iter().map(|c| c.position().y * c.mass()).sum::<f64>() / total;
        Some((total, Position::new(x, y)))
    }

    /// Halve every cell heavy enough to split and launch the new half
    /// toward `angle`, up to the per-player cell limit.
    pub fn split_player(&mut self, id: PlayerId, angle: f64) {
        let Some(player) = self.players.get(&id) else {
            return;
        };
        let max_cells = self.config.max_cells_per_player;
        if !player.can_split(max_cells) {
            return;
        }
        let mut live = player.cells.len();

        for cell_id in player.cells.clone() {
            if live >= max_cells {
                break;
            }
            let Some(cell) = self.cells.get_mut(&cell_id) else {
                continue;
            };
            if cell.mass() < self.config.split_min_mass {
                continue;
            }
            let half = cell.mass() / 2.0;
            cell.set_mass(half);
            let origin = cell.position();

            let new_id = self.next_id();
            let mut split = Entity::new(new_id, CellKind::PlayerCell, Some(id), origin, half, &mut self.rng);
            split.set_color(self.players[&id].color);
            split.set_angle(angle);
            split.set_move_engine(self.config.split_speed, self.config.split_ticks, Some(self.config.split_decay));
            self.add_entity(split);
            live += 1;
        }
    }

    /// Shed `eject_mass` from every heavy enough cell as free-floating mass
    /// launched toward `angle`.
    pub fn eject_mass(&mut self, id: PlayerId, angle: f64) {
        let Some(player) = self.players.get(&id) else {
            return;
        };
        let color = player.color;
        let (sin, cos) = heading(angle);

        for cell_id in player.cells.clone() {
            let Some(cell) = self.cells.get_mut(&cell_id) else {
                continue;
            };
            if cell.mass() < self.config.eject_min_mass {
                continue;
            }
            cell.set_mass(cell.mass() - self.config.eject_mass);
            let r = cell.radius();
            let origin = cell.position();
            let start = Position::new(origin.x + sin * r, origin.y + cos * r).truncated();

            let new_id = self.next_id();
            let mut blob = Entity::new(new_id, CellKind::EjectedMass, None, start, self.config.eject_mass, &mut self.rng);
            blob.set_color(color);
            blob.set_angle(angle);
            blob.set_move_engine(self.config.eject_speed, self.config.eject_ticks, None);
            self.add_entity(blob);
        }
    }

    /// Advance the world by one tick.
    pub fn tick(&mut self) {
        let first_kill = self.kills.len();
        let order = self.moving.clone();
        for id in order {
            let Some(mut cell) = self.take_entity(id) else {
                // eaten earlier this tick
                self.moving.retain(|&m| m != id);
                continue;
            };
            if cell.is_moving() {
                cell.on_auto_move(self);
                cell.advance(self);
            } else {
                cell.move_done(self);
                self.moving.retain(|&m| m != id);
            }
            self.restore_entity(cell);
        }

        self.consume_with_idle_player_cells();
        self.write_obituaries(first_kill);
        self.replenish_food();

        for player in self.players.values_mut() {
            let total: f64 = player.cells.iter().filter_map(|c| self.cells.get(c)).map(|c| c.mass()).sum();
            player.update_score(total);
        }

        self.tick_count += 1;
        trace!(tick = self.tick_count, moving = self.moving.len(), cells = self.cells.len(), "tick");
    }

    fn consume_with_idle_player_cells(&mut self) {
        let idle: Vec<EntityId> = self
            .players
            .values()
            .flat_map(|p| p.cells.iter().copied())
            .filter(|id| self.cells.get(id).is_some_and(|c| c.is_idle()))
            .collect();
        for id in idle {
            let Some(mut cell) = self.take_entity(id) else {
                continue;
            };
            cell.consume_overlapping(self);
            self.restore_entity(cell);
        }
    }

    fn replenish_food(&mut self) {
        while self.food_live < self.config.food_count {
            let id = self.next_id();
            let food = food::food(id, &self.config, &mut self.rng);
            self.add_entity(food);
        }
    }

    pub fn get_leaderboard(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .players
            .values()
            .filter(|p| p.is_alive())
            .map(|p| {
                let mass = self.player_mass_center(p.id).map(|(m, _)| m).unwrap_or(0.0);
                (p.name.clone(), mass as u64)
            })
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(10);
        entries
    }

    /// Remember who finished off each player that died this tick. Killers
    /// are resolved after the moving pass, once every cell is back in place.
    fn write_obituaries(&mut self, first_kill: usize) {
        for kill in &self.kills[first_kill..] {
            let Some(victim) = kill.victim_owner else {
                continue;
            };
            if self.players.get(&victim).map_or(true, |p| p.is_alive()) {
                continue;
            }
            let killer = self
                .cells
                .get(&kill.killer)
                .and_then(|cell| cell.owner())
                .and_then(|owner| self.players.get(&owner))
                .map(|p| p.name.clone())
                .unwrap_or_default();
            debug!(player = victim, %killer, "player eaten");
            self.obituaries.insert(victim, killer);
        }
    }

    /// Name of whoever ate the last cell of `victim`, if it was a player.
    pub fn get_killer_name(&self, victim: PlayerId) -> String {
        self.obituaries.get(&victim).cloned().unwrap_or_default()
    }
}

impl CellWorld for World {
    fn config(&self) -> &GameConfig {
        &self.config
    }

    fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    fn query(&self, region: &BoundingBox) -> Vec<EntityId> {
        self.index.query(region)
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.cells.get(&id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.cells.get_mut(&id)
    }

    fn reindex(&mut self, id: EntityId) {
        if let Some(cell) = self.cells.get(&id) {
            self.index.update(id, cell.position());
        }
    }

    fn take_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.cells.remove(&id)?;
        self.index.remove(id);
        Some(entity)
    }

    fn remove_entity(&mut self, entity: Entity) {
        let id = entity.id();
        self.index.remove(id);
        self.cells.remove(&id);
        entity.on_remove(self);
        self.moving.retain(|&m| m != id);
        if entity.kind() == CellKind::Food {
            self.food_live = self.food_live.saturating_sub(1);
        }
        if let Some(killer) = entity.killer() {
            self.kills.push(Kill {
                victim: id,
                victim_kind: entity.kind(),
                victim_owner: entity.owner(),
                killer,
                tick: self.tick_count,
            });
        }
        trace!(cell = id, kind = ?entity.kind(), "removed");
    }

    fn register_moving(&mut self, id: EntityId) {
        if !self.moving.contains(&id) {
            self.moving.push(id);
        }
    }

    fn free_mass_ids(&self) -> Vec<EntityId> {
        self.free_mass.clone()
    }

    fn owner(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    fn owner_cell_count(&self, id: PlayerId) -> usize {
        self.players.get(&id).map_or(0, |p| p.cells.len())
    }

    fn attach_cell(&mut self, owner: PlayerId, cell: EntityId) {
        if let Some(player) = self.players.get_mut(&owner) {
            if !player.cells.contains(&cell) {
                player.cells.push(cell);
            }
        }
    }

    fn detach_cell(&mut self, owner: PlayerId, cell: EntityId) {
        if let Some(player) = self.players.get_mut(&owner) {
            player.cells.retain(|&c| c != cell);
        }
    }

    fn track_free_mass(&mut self, cell: EntityId) {
        if !self.free_mass.contains(&cell) {
            self.free_mass.push(cell);
        }
    }

    fn untrack_free_mass(&mut self, cell: EntityId) {
        self.free_mass.retain(|&c| c != cell);
    }

    fn spawn_split_entity(
        &mut self,
        owner: PlayerId,
        parent: &Entity,
        angle: f64,
        mass: f64,
        speed: f64,
    ) -> Option<EntityId> {
        let color = self.players.get(&owner)?.color;
        let id = self.next_id();
        let mut sibling = Entity::new(id, CellKind::PlayerCell, Some(owner), parent.position(), mass, &mut self.rng);
        sibling.set_color(color);
        sibling.set_angle(angle);
        sibling.set_move_engine(speed, self.config.split_push_ticks, None);
        Some(self.add_entity(sibling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BORDER_BOUNCE_MARGIN;

    fn config() -> GameConfig {
        GameConfig {
            border_right: 3000.0,
            border_bottom: 3000.0,
            food_count: 20,
            virus_count: 3,
            rng_seed: Some(17),
            ..GameConfig::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = GameConfig {
            max_cells_per_player: 0,
            ..config()
        };
        assert!(World::new(bad).is_err());
    }

    #[test]
    fn smallest_valid_world_spawns_everything() {
        let small = GameConfig {
            border_right: 401.0,
            border_bottom: 401.0,
            ..config()
        };
        assert!(small.validate().is_ok());
        let mut world = World::new(small).unwrap();
        world.populate();
        for n in 0..5 {
            world.add_player(format!("p{n}"), "");
        }
        world.tick();
        assert_eq!(world.players().count(), 5);
    }

    #[test]
    fn populate_and_replenish() {
        let mut world = World::new(config()).unwrap();
        world.populate();
        assert_eq!(world.cells().filter(|c| c.kind() == CellKind::Food).count(), 20);
        assert_eq!(world.cells().filter(|c| c.kind() == CellKind::Virus).count(), 3);

        let food = world.cells().find(|c| c.kind() == CellKind::Food).unwrap().id();
        let eaten = world.take_entity(food).unwrap();
        world.remove_entity(eaten);
        world.tick();
        assert_eq!(world.cells().filter(|c| c.kind() == CellKind::Food).count(), 20);
    }

    #[test]
    fn player_cells_follow_hooks() {
        let mut world = World::new(config()).unwrap();
        let p = world.add_player("eve", "skin");
        assert_eq!(world.owner_cell_count(p), 1);
        let cell = world.player_cells(p)[0];
        let entity = world.entity(cell).unwrap();
        assert_eq!(entity.name(&world), "eve");
        assert_eq!(entity.skin(&world), "skin");

        world.remove_player(p);
        assert!(world.entity(cell).is_none());
        assert!(world.player(p).is_none());
    }

    #[test]
    fn ownerless_cells_have_no_name() {
        let mut world = World::new(config()).unwrap();
        let blob = world.spawn(CellKind::EjectedMass, None, Position::new(500.0, 500.0), 12.0);
        let virus = world.spawn(CellKind::Virus, None, Position::new(900.0, 500.0), 100.0);
        let blob = world.entity(blob).unwrap();
        assert_eq!(blob.name(&world), "");
        assert_eq!(blob.skin(&world), "%proton");
        assert_eq!(world.entity(virus).unwrap().skin(&world), "%gas");
    }

    #[test]
    fn split_respects_cell_limit() {
        let mut world = World::new(GameConfig {
            max_cells_per_player: 3,
            ..config()
        })
        .unwrap();
        let p = world.add_player("split", "");
        let cell = world.player_cells(p)[0];
        world.entity_mut(cell).unwrap().set_mass(400.0);

        world.split_player(p, 0.0);
        assert_eq!(world.owner_cell_count(p), 2);
        world.split_player(p, 0.0);
        assert_eq!(world.owner_cell_count(p), 3);
        let total: f64 = world.player_cells(p).iter().map(|c| world.entity(*c).unwrap().mass()).sum();
        assert_eq!(total, 400.0);
        assert!(world.moving_ids().len() >= 2);
    }

    #[test]
    fn eject_spawns_free_mass() {
        let mut world = World::new(config()).unwrap();
        let p = world.add_player("spit", "");
        let cell = world.player_cells(p)[0];
        world.entity_mut(cell).unwrap().set_mass(50.0);

        world.eject_mass(p, 1.0);
        assert_eq!(world.entity(cell).unwrap().mass(), 50.0 - world.config().eject_mass);
        assert_eq!(world.free_mass_ids().len(), 1);
        let blob = world.free_mass_ids()[0];
        assert!(world.moving_ids().contains(&blob));

        for _ in 0..40 {
            world.tick();
        }
        assert!(world.moving_ids().is_empty());
        let settled = world.entity(blob).unwrap().position();
        assert!(settled.x >= BORDER_BOUNCE_MARGIN && settled.y >= BORDER_BOUNCE_MARGIN);
    }

    #[test]
    fn kills_record_the_eater() {
        let mut world = World::new(GameConfig {
            food_count: 0,
            virus_count: 0,
            ..config()
        })
        .unwrap();
        let hunter = world.add_player("hunter", "");
        let prey = world.add_player("prey", "");
        let big = world.player_cells(hunter)[0];
        let small = world.player_cells(prey)[0];
        world.entity_mut(big).unwrap().set_mass(200.0);
        world.entity_mut(big).unwrap().set_position(Position::new(1500.0, 1500.0));
        world.reindex(big);
        world.entity_mut(small).unwrap().set_position(Position::new(1510.0, 1500.0));
        world.reindex(small);

        world.tick();
        assert!(world.entity(small).is_none());
        assert!(!world.player(prey).unwrap().is_alive());
        assert_eq!(world.get_killer_name(prey), "hunter");
        assert_eq!(world.entity(big).unwrap().mass(), 210.0);
    }
}
