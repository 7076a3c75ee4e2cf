use rand::Rng;
use serde::Serialize;
use tracing::trace;

use crate::config::{GameConfig, DEFAULT_MOVE_DECAY};
use crate::game::physics::{BoundingBox, Position};
use crate::game::player::PlayerId;
use crate::game::world::CellWorld;

pub type EntityId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    PlayerCell,
    Food,
    Virus,
    EjectedMass,
    MotherCell,
}

impl CellKind {
    pub fn is_edible(self) -> bool {
        !matches!(self, CellKind::MotherCell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}

/// Residual motion applied by the move engine, one tick at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveEngine {
    pub speed: f64,
    pub ticks: u32,
    pub decay: f64,
}

impl MoveEngine {
    pub fn new(speed: f64, ticks: u32, decay: Option<f64>) -> Self {
        MoveEngine {
            speed,
            ticks,
            decay: decay.filter(|d| d.is_finite()).unwrap_or(DEFAULT_MOVE_DECAY),
        }
    }
}

impl Default for MoveEngine {
    fn default() -> Self {
        MoveEngine::new(0.0, 0, None)
    }
}

/// One circular cell in the world.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: CellKind,
    owner: Option<PlayerId>,
    pub(crate) position: Position,
    pub(crate) mass: f64,
    color: Color,
    killer: Option<EntityId>,
    pub(crate) angle: f64,
    pub(crate) movement: MoveEngine,
}

impl Entity {
    /// Build a cell with a random green-ish colour drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(
        id: EntityId,
        kind: CellKind,
        owner: Option<PlayerId>,
        position: Position,
        mass: f64,
        rng: &mut R,
    ) -> Self {
        let color = Color::new(
            rng.gen_range(0..32),
            196 + rng.gen_range(0..32),
            rng.gen_range(0..32),
        );
        Entity {
            id,
            kind,
            owner,
            position,
            mass,
            color,
            killer: None,
            angle: 0.0,
            movement: MoveEngine::default(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Overwrite the mass. Non-positive or non-finite values are ignored.
    pub fn set_mass(&mut self, mass: f64) {
        if mass > 0.0 && mass.is_finite() {
            self.mass = mass;
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, radians: f64) {
        self.angle = radians;
    }

    pub fn killer(&self) -> Option<EntityId> {
        self.killer
    }

    /// Record who ate this cell. Only the first call sticks.
    pub fn set_killer(&mut self, killer: EntityId) -> bool {
        if self.killer.is_some() {
            return false;
        }
        self.killer = Some(killer);
        true
    }

    pub fn movement(&self) -> MoveEngine {
        self.movement
    }

    /// Arm the move engine. A missing or non-finite decay falls back to 0.75.
    pub fn set_move_engine(&mut self, speed: f64, ticks: u32, decay: Option<f64>) {
        self.movement = MoveEngine::new(speed, ticks, decay);
    }

    pub fn is_moving(&self) -> bool {
        self.movement.ticks > 0
    }

    pub fn is_idle(&self) -> bool {
        self.movement.ticks == 0
    }

    /// `ceil(sqrt(100 * mass))`
    pub fn radius(&self) -> f64 {
        (100.0 * self.mass).sqrt().ceil()
    }

    /// Radius squared without the square root: `floor(100 * mass)`.
    pub fn square_size(&self) -> f64 {
        (100.0 * self.mass).floor()
    }

    /// Player-controlled speed for the current mass.
    pub fn speed_for_mass(&self, config: &GameConfig) -> f64 {
        config.base_speed * self.mass.powf(-1.0 / 4.5) * 50.0 / 40.0
    }

    pub fn name<'w>(&self, world: &'w dyn CellWorld) -> &'w str {
        self.owner
            .and_then(|owner| world.owner(owner))
            .map(|player| player.name.as_str())
            .unwrap_or("")
    }

    pub fn skin<'w>(&self, world: &'w dyn CellWorld) -> &'w str {
        match self.kind {
            CellKind::PlayerCell => self
                .owner
                .and_then(|owner| world.owner(owner))
                .map(|player| player.skin.as_str())
                .unwrap_or(""),
            CellKind::Virus | CellKind::MotherCell => "%gas",
            CellKind::EjectedMass => "%proton",
            CellKind::Food => "",
        }
    }

    /// Commit a tick's destination, dropping fractional coordinates.
    pub(crate) fn commit_position(&mut self, destination: Position) {
        self.position = destination.truncated();
    }

    // Hooks

    /// Called on the eaten cell; its mass goes to the consumer.
    pub fn on_consume(&self, consumer: &mut Entity, world: &mut dyn CellWorld) {
        trace!(cell = self.id, consumer = consumer.id, kind = ?self.kind, "consumed");
        consumer.add_mass(self.mass, world);
    }

    pub fn on_add(&self, world: &mut dyn CellWorld) {
        match self.kind {
            CellKind::PlayerCell => {
                if let Some(owner) = self.owner {
                    world.attach_cell(owner, self.id);
                }
            }
            CellKind::EjectedMass => world.track_free_mass(self.id),
            _ => {}
        }
    }

    pub fn on_remove(&self, world: &mut dyn CellWorld) {
        match self.kind {
            CellKind::PlayerCell => {
                if let Some(owner) = self.owner {
                    world.detach_cell(owner, self.id);
                }
            }
            CellKind::EjectedMass => world.untrack_free_mass(self.id),
            _ => {}
        }
    }

    pub fn on_auto_move(&mut self, _world: &mut dyn CellWorld) {}

    pub fn move_done(&mut self, world: &mut dyn CellWorld) {
        self.on_auto_move(world);
    }

    /// Whether the next snapshot should carry this cell.
    pub fn send_update(&self) -> bool {
        match self.kind {
            CellKind::Food => self.is_moving(),
            _ => true,
        }
    }

    pub fn collision_check(&self, region: &BoundingBox) -> bool {
        region.contains(self.position)
    }

    pub fn visible_check(&self, view: &BoundingBox) -> bool {
        self.collision_check(view)
    }

    /// Circle containment: is this cell inside a circle of squared radius
    /// `square_size` centred at `center`? Drops the `2·d·r` term so no
    /// square root is needed.
    pub fn collision_check2(&self, square_size: f64, center: Position) -> bool {
        let dx = self.position.x - center.x;
        let dy = self.position.y - center.y;
        dx * dx + dy * dy + self.square_size() <= square_size
    }
}
