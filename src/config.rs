use std::path::Path;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// World border
pub const BORDER_LEFT: f64 = 0.0;
pub const BORDER_RIGHT: f64 = 6000.0;
pub const BORDER_TOP: f64 = 0.0;
pub const BORDER_BOTTOM: f64 = 6000.0;
pub const BORDER_BOUNCE_MARGIN: f64 = 40.0; // fixed, not the entity radius

// Tick loop
pub const TICK_INTERVAL_MS: u64 = 40;

// Player constants
pub const STARTING_MASS: f64 = 10.0;
pub const PLAYER_SPAWN_MARGIN: f64 = 200.0;
pub const BASE_SPEED: f64 = 30.0;
pub const MAX_MASS_PER_PLAYER: f64 = 22500.0;
pub const MAX_CELLS_PER_PLAYER: usize = 16;
pub const EAT_MASS_RATIO: f64 = 1.25;

// Movement engine
pub const DEFAULT_MOVE_DECAY: f64 = 0.75;
pub const MAX_LAUNCH_SPEED: f64 = 100_000.0;

// Auto-split push (mass cap overflow)
pub const SPLIT_PUSH_SPEED: f64 = 480.0;
pub const SPLIT_PUSH_TICKS: u32 = 10;

// Player split action
pub const SPLIT_MIN_MASS: f64 = 36.0;
pub const SPLIT_SPEED: f64 = 130.0;
pub const SPLIT_TICKS: u32 = 32;
pub const SPLIT_DECAY: f64 = 0.85;

// Eject mass constants
pub const EJECT_MASS: f64 = 12.0;
pub const EJECT_MIN_MASS: f64 = 32.0;
pub const EJECT_SPEED: f64 = 160.0;
pub const EJECT_TICKS: u32 = 20;

// Ejected mass pairs may sink this far into each other before separating
pub const EJECT_OVERLAP_SLACK: f64 = 5.0;

// Food constants
pub const FOOD_COUNT: usize = 500;
pub const FOOD_MASS: f64 = 1.0;

// Virus constants
pub const VIRUS_COUNT: usize = 15;
pub const VIRUS_MASS: f64 = 100.0;

// Viewport
pub const BASE_VIEWPORT_SIZE: f64 = 800.0;

// Spatial index bucket edge
pub const INDEX_CELL_SIZE: f64 = 200.0;

pub const CONFIG_ENV_VAR: &str = "CELLSIM_CONFIG";

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Numeric tunables consulted by the physics core and the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub border_left: f64,
    pub border_right: f64,
    pub border_top: f64,
    pub border_bottom: f64,
    pub tick_interval_ms: u64,
    pub base_speed: f64,
    pub starting_mass: f64,
    pub max_mass_per_player: f64,
    pub max_cells_per_player: usize,
    pub split_push_speed: f64,
    pub split_push_ticks: u32,
    pub split_min_mass: f64,
    pub split_speed: f64,
    pub split_ticks: u32,
    pub split_decay: f64,
    pub eject_mass: f64,
    pub eject_min_mass: f64,
    pub eject_speed: f64,
    pub eject_ticks: u32,
    pub food_count: usize,
    pub food_mass: f64,
    pub virus_count: usize,
    pub virus_mass: f64,
    pub index_cell_size: f64,
    /// Seed for the world RNG. `None` draws one from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            border_left: BORDER_LEFT,
            border_right: BORDER_RIGHT,
            border_top: BORDER_TOP,
            border_bottom: BORDER_BOTTOM,
            tick_interval_ms: TICK_INTERVAL_MS,
            base_speed: BASE_SPEED,
            starting_mass: STARTING_MASS,
            max_mass_per_player: MAX_MASS_PER_PLAYER,
            max_cells_per_player: MAX_CELLS_PER_PLAYER,
            split_push_speed: SPLIT_PUSH_SPEED,
            split_push_ticks: SPLIT_PUSH_TICKS,
            split_min_mass: SPLIT_MIN_MASS,
            split_speed: SPLIT_SPEED,
            split_ticks: SPLIT_TICKS,
            split_decay: SPLIT_DECAY,
            eject_mass: EJECT_MASS,
            eject_min_mass: EJECT_MIN_MASS,
            eject_speed: EJECT_SPEED,
            eject_ticks: EJECT_TICKS,
            food_count: FOOD_COUNT,
            food_mass: FOOD_MASS,
            virus_count: VIRUS_COUNT,
            virus_mass: VIRUS_MASS,
            index_cell_size: INDEX_CELL_SIZE,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    /// Read a JSON config file; missing fields fall back to the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `CELLSIM_CONFIG` when set, otherwise use the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Closest a virus may spawn to the border: its radius, never less
    /// than the bounce margin.
    pub fn virus_spawn_margin(&self) -> f64 {
        (100.0 * self.virus_mass).sqrt().ceil().max(BORDER_BOUNCE_MARGIN)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Every spawner needs a non-empty range on both axes.
        let margin = PLAYER_SPAWN_MARGIN.max(self.virus_spawn_margin());
        if !(self.border_right - self.border_left > 2.0 * margin) {
            return Err(ConfigError::Invalid("border width leaves no room to spawn"));
        }
        if !(self.border_bottom - self.border_top > 2.0 * margin) {
            return Err(ConfigError::Invalid("border height leaves no room to spawn"));
        }
        let speeds = [self.base_speed, self.split_push_speed, self.split_speed, self.eject_speed];
        if speeds.iter().any(|s| !(0.0..=MAX_LAUNCH_SPEED).contains(s)) {
            return Err(ConfigError::Invalid("speeds must lie between 0 and MAX_LAUNCH_SPEED"));
        }
        if !(self.max_mass_per_player > 0.0) {
            return Err(ConfigError::Invalid("max_mass_per_player must be positive"));
        }
        if self.max_cells_per_player == 0 {
            return Err(ConfigError::Invalid("max_cells_per_player must be non-zero"));
        }
        if !(self.starting_mass > 0.0) || !(self.food_mass > 0.0) || !(self.virus_mass > 0.0) {
            return Err(ConfigError::Invalid("entity masses must be positive"));
        }
        if !(self.eject_mass > 0.0) || self.eject_min_mass <= self.eject_mass {
            return Err(ConfigError::Invalid("eject_min_mass must exceed a positive eject_mass"));
        }
        if !(self.index_cell_size > 0.0) {
            return Err(ConfigError::Invalid("index_cell_size must be positive"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be non-zero"));
        }
        Ok(())
    }

    /// World RNG, reproducible when `rng_seed` is set.
    pub fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::seed_from_u64(rand::random()),
        }
    }
}
