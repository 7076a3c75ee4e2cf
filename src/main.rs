use rand::Rng;
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cellsim::config::GameConfig;
use cellsim::game::engine::{self, build_view, SharedWorld};
use cellsim::CellWorld;

const DEMO_PLAYERS: usize = 8;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match GameConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "could not load configuration");
            std::process::exit(1);
        }
    };

    let world = match engine::create_world(config.clone()) {
        Ok(world) => world,
        Err(err) => {
            error!(%err, "could not create world");
            std::process::exit(1);
        }
    };
    info!(
        width = config.border_right - config.border_left,
        height = config.border_bottom - config.border_top,
        "world created"
    );

    {
        let mut w = world.write().await;
        for n in 0..DEMO_PLAYERS {
            w.add_player(format!("bot-{n}"), "");
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_handle = tokio::spawn(engine::game_loop(world.clone(), shutdown_rx.clone()));
    info!(interval_ms = config.tick_interval_ms, "game loop running");

    tokio::spawn(drive_bots(world.clone(), shutdown_rx));

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
    }
    let _ = shutdown_tx.send(true);
    let _ = loop_handle.await;
}

/// Stand-in for connected clients: bots split and eject at random.
async fn drive_bots(world: SharedWorld, mut shutdown: watch::Receiver<bool>) {
    let mut every = interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = every.tick() => {}
            _ = shutdown.changed() => break,
        }

        let mut w = world.write().await;
        let ids: Vec<u64> = w.players().filter(|p| p.is_alive()).map(|p| p.id).collect();
        for id in ids {
            let angle = w.random_angle();
            let roll: f64 = w.rng().gen();
            if roll < 0.2 {
                w.split_player(id, angle);
            } else if roll < 0.6 {
                w.eject_mass(id, angle);
            }
        }

        let dead: Vec<u64> = w.players().filter(|p| !p.is_alive()).map(|p| p.id).collect();
        for id in dead {
            info!(player = id, killer = %w.get_killer_name(id), "bot eaten");
            w.remove_player(id);
        }
        if w.players().count() < DEMO_PLAYERS {
            let name = format!("bot-{}", w.tick_count());
            w.add_player(name, "");
        }

        let leader = w.players().find(|p| p.is_alive()).map(|p| p.id);
        if let Some(view) = leader.and_then(|id| build_view(&w, id)) {
            let bytes = serde_json::to_vec(&view).map(|b| b.len()).unwrap_or(0);
            info!(tick = view.tick, visible = view.cells.len(), bytes, "leader view");
        }
    }
}
