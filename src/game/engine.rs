use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{ConfigError, GameConfig, BASE_VIEWPORT_SIZE};
use crate::game::physics::BoundingBox;
use crate::game::player::{Player, PlayerId};
use crate::game::snapshot::{CellState, LeaderboardEntry, ViewSnapshot};
use crate::game::world::{CellWorld, World};

pub type SharedWorld = Arc<RwLock<World>>;

pub fn create_world(config: GameConfig) -> Result<SharedWorld, ConfigError> {
    let mut world = World::new(config)?;
    world.populate();
    Ok(Arc::new(RwLock::new(world)))
}

/// Tick the world at the configured interval until `shutdown` flips to true.
pub async fn game_loop(world: SharedWorld, mut shutdown: watch::Receiver<bool>) {
    let period = world.read().await.config().tick_interval_ms;
    let mut tick_interval = interval(Duration::from_millis(period));
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let mut w = world.write().await;
                w.tick();
                let kills = w.drain_kills();
                if !kills.is_empty() {
                    debug!(tick = w.tick_count(), kills = kills.len(), "cells consumed");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    let ticks = world.read().await.tick_count();
    info!(ticks, "game loop stopped");
}

pub fn build_view(world: &World, player_id: PlayerId) -> Option<ViewSnapshot> {
    let player = world.player(player_id)?;
    if !player.is_alive() {
        return None;
    }

    let (total_mass, center) = world.player_mass_center(player_id)?;
    let view_size = BASE_VIEWPORT_SIZE * Player::viewport_scale(total_mass);
    let view = BoundingBox::around(center, view_size);

    let cells: Vec<CellState> = world
        .cells()
        .filter(|c| c.visible_check(&view))
        .map(|c| CellState {
            id: c.id(),
            kind: c.kind(),
            x: c.position().x,
            y: c.position().y,
            radius: c.radius(),
            color: c.color(),
            name: c.name(world).to_string(),
            skin: c.skin(world).to_string(),
            dirty: c.send_update(),
        })
        .collect();

    let leaderboard: Vec<LeaderboardEntry> = world
        .get_leaderboard()
        .into_iter()
        .map(|(name, score)| LeaderboardEntry { name, score })
        .collect();

    Some(ViewSnapshot {
        player: player_id,
        tick: world.tick_count(),
        center_x: center.x,
        center_y: center.y,
        cells,
        leaderboard,
    })
}
