use serde::Serialize;

use crate::game::entity::{CellKind, Color, EntityId};
use crate::game::player::PlayerId;

#[derive(Debug, Serialize, Clone)]
pub struct CellState {
    pub id: EntityId,
    pub kind: CellKind,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub skin: String,
    pub dirty: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
}

/// What one player can see this tick.
#[derive(Debug, Serialize, Clone)]
pub struct ViewSnapshot {
    pub player: PlayerId,
    pub tick: u64,
    pub center_x: f64,
    pub center_y: f64,
    pub cells: Vec<CellState>,
    pub leaderboard: Vec<LeaderboardEntry>,
}
