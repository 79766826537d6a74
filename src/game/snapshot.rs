//! World snapshot assembly

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::combat::Projectile;
use super::items::Item;
use super::obstacles::Obstacle;
use super::player::Player;
use super::r#match::{MatchPhase, MatchState};
use super::standings::{live_standings, Standing};
use super::zone::Zone;

/// Everything a client needs to render one tick
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub players: BTreeMap<Uuid, Player>,
    pub standings: Vec<Standing>,
    pub projectiles: Vec<Projectile>,
    pub items: Vec<Item>,
    pub obstacles: Arc<[Obstacle]>,
    pub zone: Zone,
    pub phase: MatchPhase,
    /// Whole seconds left in the current phase, never negative
    pub phase_timer: u32,
    pub winner_id: Option<Uuid>,
    pub timestamp: u64,
}

/// Builds snapshots for network transmission
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    pub fn build(state: &MatchState, timestamp: u64) -> GameState {
        // Tracked standings once a match is running, so departed players stay listed
        let standings = match state.phase {
            MatchPhase::InGame | MatchPhase::GameOver => state.standings.sorted(),
            MatchPhase::Lobby | MatchPhase::Countdown => live_standings(&state.players),
        };

        GameState {
            players: state.players.clone(),
            standings,
            projectiles: state.combat.projectiles().cloned().collect(),
            items: state.items.items().cloned().collect(),
            obstacles: state.obstacles.shared(),
            zone: state.zone.zone(),
            phase: state.phase,
            phase_timer: state.phase_timer.max(0.0).ceil() as u32,
            winner_id: state.winner_id,
            timestamp,
        }
    }
}
