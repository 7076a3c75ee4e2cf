//! Movement, collision and growth core for a tick-driven cell arena.

pub mod config;
pub mod game;

pub use config::{ConfigError, GameConfig};
pub use game::entity::{CellKind, Entity, EntityId};
pub use game::world::{CellWorld, World};
