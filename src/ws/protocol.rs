//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is JSON of the form `{"type": "...", "data": ...}`.

use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use uuid::Uuid;

use crate::game::combat::WeaponType;
use crate::game::items::ItemType;
use crate::game::player::{InputState, Player};
use crate::game::snapshot::GameState;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Requested display name
    SetName(String),

    /// Movement keys and aim, replaces the previous input
    PlayerInput(InputState),

    /// Fire the active weapon at an angle (radians)
    Shoot(f32),

    /// Use a carried item
    UseItem(ItemType),
}

impl ClientMsg {
    /// Parse a text frame, rejecting anything malformed or carrying non-finite numbers
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let msg: ClientMsg = serde_json::from_str(text)?;
        match &msg {
            ClientMsg::PlayerInput(input) if !input.angle.is_finite() => {
                Err(ProtocolError::NonFinite("player_input.angle"))
            }
            ClientMsg::Shoot(angle) if !angle.is_finite() => Err(ProtocolError::NonFinite("shoot")),
            _ => Ok(msg),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Non-finite number in {0}")]
    NonFinite(&'static str),
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Sent once to a newly connected session
    Welcome(Welcome),

    /// Player joined the match
    PlayerJoin(Player),

    /// Player left the match
    PlayerLeave { id: Uuid },

    /// Full world snapshot, once per tick
    GameState(Arc<GameState>),

    /// A player was eliminated
    KillLog(KillLogEntry),

    /// Visual trigger for clients
    EffectEvent(EffectEvent),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub session_id: Uuid,
    pub game_state: Arc<GameState>,
}

/// Who scored an elimination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Killer {
    Player(Uuid),
    Zone,
}

/// Serialized as the killer's id, or "ZONE"
impl Serialize for Killer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Killer::Player(id) => id.serialize(serializer),
            Killer::Zone => serializer.serialize_str("ZONE"),
        }
    }
}

/// Weapon used for an elimination, or the zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KillCause {
    Pistol,
    Rifle,
    Shotgun,
    Sniper,
    #[serde(rename = "ZONE")]
    Zone,
}

impl From<WeaponType> for KillCause {
    fn from(weapon: WeaponType) -> Self {
        match weapon {
            WeaponType::Pistol => KillCause::Pistol,
            WeaponType::Rifle => KillCause::Rifle,
            WeaponType::Shotgun => KillCause::Shotgun,
            WeaponType::Sniper => KillCause::Sniper,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KillLogEntry {
    pub killer_id: Killer,
    pub victim_id: Uuid,
    pub weapon: KillCause,
    /// Unix millis
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    Blood,
    Sparks,
    MuzzleFlash,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectEvent {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub effect: EffectType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_client_messages() {
        assert!(matches!(
            ClientMsg::parse(r#"{"type":"set_name","data":"  Neo  "}"#),
            Ok(ClientMsg::SetName(name)) if name == "  Neo  "
        ));
        assert!(matches!(
            ClientMsg::parse(r#"{"type":"shoot","data":1.5}"#),
            Ok(ClientMsg::Shoot(angle)) if angle == 1.5
        ));
        assert!(matches!(
            ClientMsg::parse(r#"{"type":"use_item","data":"medkit"}"#),
            Ok(ClientMsg::UseItem(ItemType::Medkit))
        ));

        let input = ClientMsg::parse(
            r#"{"type":"player_input","data":{"up":true,"down":false,"left":false,"right":true,"angle":-0.5}}"#,
        )
        .unwrap();
        match input {
            ClientMsg::PlayerInput(state) => {
                assert!(state.up && state.right && !state.down && !state.left);
                assert_eq!(state.angle, -0.5);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_messages() {
        for bad in [
            r#"{"type":"shoot","data":"north"}"#,
            r#"{"type":"teleport","data":{}}"#,
            r#"{"type":"use_item","data":"grenade"}"#,
            r#"{"type":"player_input","data":{"up":true}}"#,
            r#"{"data":1.0}"#,
            "not json",
        ] {
            assert!(matches!(ClientMsg::parse(bad), Err(ProtocolError::Malformed(_))), "{}", bad);
        }
    }

    #[test]
    fn test_parse_rejects_overflowing_angle() {
        // Fits in f64 but overflows to infinity as f32
        let result = ClientMsg::parse(r#"{"type":"shoot","data":1e300}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_message_wire_format() {
        let victim = Uuid::from_u128(7);
        let zone_kill = ServerMsg::KillLog(KillLogEntry {
            killer_id: Killer::Zone,
            victim_id: victim,
            weapon: KillCause::Zone,
            timestamp: 99,
        });
        assert_eq!(
            serde_json::to_value(&zone_kill).unwrap(),
            json!({
                "type": "kill_log",
                "data": {"killerId": "ZONE", "victimId": victim, "weapon": "ZONE", "timestamp": 99}
            })
        );

        let shooter = Uuid::from_u128(3);
        let shot_kill = ServerMsg::KillLog(KillLogEntry {
            killer_id: Killer::Player(shooter),
            victim_id: victim,
            weapon: KillCause::from(WeaponType::Shotgun),
            timestamp: 1,
        });
        let value = serde_json::to_value(&shot_kill).unwrap();
        assert_eq!(value["data"]["killerId"], json!(shooter.to_string()));
        assert_eq!(value["data"]["weapon"], json!("shotgun"));

        let effect = ServerMsg::EffectEvent(EffectEvent {
            x: 1.0,
            y: 2.0,
            effect: EffectType::MuzzleFlash,
        });
        assert_eq!(
            serde_json::to_value(&effect).unwrap(),
            json!({"type": "effect_event", "data": {"x": 1.0, "y": 2.0, "type": "muzzle_flash"}})
        );

        let leave = ServerMsg::PlayerLeave { id: victim };
        assert_eq!(
            serde_json::to_value(&leave).unwrap(),
            json!({"type": "player_leave", "data": {"id": victim}})
        );
    }
}
