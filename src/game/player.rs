//! Player state (authoritative) and display-name handling

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GameConfig;

use super::combat::WeaponType;
use super::obstacles::ObstacleField;

/// Longest display name accepted, in characters
pub const MAX_NAME_LEN: usize = 18;

const PLAYER_COLORS: [u32; 6] = [0xff6b6b, 0x4ecdc4, 0x45b7d1, 0xf9ca24, 0x6c5ce7, 0xa29bfe];

/// Movement keys and aim for one session, replaced wholesale on each update
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Aim direction in radians
    pub angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub medkits: u32,
    pub ammo: u32,
}

/// Player state in a match (authoritative)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Facing angle in radians
    pub angle: f32,
    pub color: u32,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub active_weapon: WeaponType,
    pub kills: u32,
    pub inventory: Inventory,
}

impl Player {
    /// Fresh player at a random free spawn point. Falls back to a generated
    /// name when the requested one sanitizes to nothing.
    pub fn spawn<R: Rng>(
        id: Uuid,
        requested_name: Option<&str>,
        obstacles: &ObstacleField,
        config: &GameConfig,
        rng: &mut R,
    ) -> Self {
        let (x, y) = obstacles.find_spawn(rng, config.player_size);
        let name = requested_name
            .and_then(sanitize_name)
            .unwrap_or_else(|| default_name(id));
        let color = PLAYER_COLORS[rng.gen_range(0..PLAYER_COLORS.len())];

        Self {
            id,
            name,
            x,
            y,
            angle: 0.0,
            color,
            health: config.player_max_health,
            max_health: config.player_max_health,
            alive: true,
            active_weapon: WeaponType::default(),
            kills: 0,
            inventory: Inventory {
                medkits: 0,
                ammo: config.starting_ammo,
            },
        }
    }

    /// Bring the player back for a new round
    pub fn revive(&mut self) {
        self.alive = true;
        self.health = self.max_health;
        self.kills = 0;
    }

    /// Apply damage, returns true if this killed the player
    pub fn take_damage(&mut self, damage: f32) -> bool {
        self.health = (self.health - damage).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            true
        } else {
            false
        }
    }
}

fn default_name(id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!("Player-{}", &simple[..4])
}

/// Trim, collapse inner whitespace runs to one space and cap the length.
/// The cut is not re-trimmed, so a name may end in a space.
/// Returns None when nothing is left.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_NAME_LEN).collect();

    (!truncated.is_empty()).then_some(truncated)
}
