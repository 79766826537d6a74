//! Shrinking safe zone and out-of-zone damage

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::{KillCause, KillLogEntry, Killer, ServerMsg};

use super::physics::PhysicsSystem;
use super::player::Player;

/// Seconds between zone damage passes
const DAMAGE_INTERVAL: f32 = 1.0;

/// Safe circle, centered on the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Zone {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct ZoneController {
    zone: Zone,
    initial_radius: f32,
    shrink_rate: f32,
    damage: f32,
    /// Seconds accumulated towards the next damage pass
    damage_timer: f32,
}

impl ZoneController {
    pub fn new(config: &GameConfig) -> Self {
        let (x, y) = config.zone_center();
        Self {
            zone: Zone {
                x,
                y,
                radius: config.zone_initial_radius,
            },
            initial_radius: config.zone_initial_radius,
            shrink_rate: config.zone_shrink_rate,
            damage: config.zone_damage,
            damage_timer: 0.0,
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Keep the zone at full size (lobby)
    pub fn hold(&mut self) {
        self.zone.radius = self.initial_radius;
    }

    /// Restart the damage cadence at the beginning of a round
    pub fn reset_damage_timer(&mut self) {
        self.damage_timer = 0.0;
    }

    /// Shrink linearly, never below zero
    pub fn shrink(&mut self, dt: f32) {
        self.zone.radius = (self.zone.radius - self.shrink_rate * dt).max(0.0);
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        PhysicsSystem::is_in_zone(x, y, self.zone.x, self.zone.y, self.zone.radius)
    }

    /// Advance the damage cadence. Returns true on ticks where damage applies.
    pub fn damage_due(&mut self, dt: f32) -> bool {
        self.damage_timer += dt;
        if self.damage_timer >= DAMAGE_INTERVAL {
            self.damage_timer = 0.0;
            true
        } else {
            false
        }
    }

    /// Damage every alive player outside the zone, attributing kills to the zone
    pub fn apply_damage(&self, players: &mut BTreeMap<Uuid, Player>, now_ms: u64, events: &mut Vec<ServerMsg>) {
        for player in players.values_mut() {
            if !player.alive || self.contains(player.x, player.y) {
                continue;
            }

            if player.take_damage(self.damage) {
                debug!(victim_id = %player.id, "Player eliminated by zone");
                events.push(ServerMsg::KillLog(KillLogEntry {
                    killer_id: Killer::Zone,
                    victim_id: player.id,
                    weapon: KillCause::Zone,
                    timestamp: now_ms,
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::obstacles::ObstacleField;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_shrink_floors_at_zero_and_hold_restores() {
        let config = GameConfig::default();
        let mut zone = ZoneController::new(&config);

        zone.shrink(2.0);
        assert_eq!(zone.zone().radius, 1526.0);

        zone.shrink(1000.0);
        assert_eq!(zone.zone().radius, 0.0);

        zone.hold();
        assert_eq!(zone.zone().radius, 1536.0);
        assert_eq!((zone.zone().x, zone.zone().y), (1600.0, 1216.0));
    }

    #[test]
    fn test_damage_cadence_is_once_per_second() {
        let config = GameConfig::default();
        let mut zone = ZoneController::new(&config);

        let due: Vec<bool> = (0..8).map(|_| zone.damage_due(0.25)).collect();
        assert_eq!(due, vec![false, false, false, true, false, false, false, true]);

        assert!(!zone.damage_due(0.5));
        zone.reset_damage_timer();
        assert!(!zone.damage_due(0.75));
        assert!(zone.damage_due(0.25));
    }

    #[test]
    fn test_apply_damage_only_outside_and_kills_attributed_to_zone() {
        let config = GameConfig::default();
        let field = ObstacleField::from_obstacles(Vec::new(), config.world_width, config.world_height);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let zone = ZoneController::new(&config);

        let mut inside = Player::spawn(Uuid::from_u128(1), Some("Inside"), &field, &config, &mut rng);
        inside.x = 1600.0;
        inside.y = 1216.0;
        let mut outside = Player::spawn(Uuid::from_u128(2), Some("Outside"), &field, &config, &mut rng);
        outside.x = 16.0;
        outside.y = 16.0;
        outside.health = 25.0;

        let mut players = BTreeMap::new();
        players.insert(inside.id, inside);
        players.insert(outside.id, outside);
        let mut events = Vec::new();

        zone.apply_damage(&mut players, 10, &mut events);
        zone.apply_damage(&mut players, 20, &mut events);
        assert!(events.is_empty());
        assert_eq!(players[&Uuid::from_u128(2)].health, 5.0);

        zone.apply_damage(&mut players, 30, &mut events);
        assert!(!players[&Uuid::from_u128(2)].alive);
        assert_eq!(players[&Uuid::from_u128(1)].health, 100.0);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ServerMsg::KillLog(entry) => {
                assert_eq!(entry.killer_id, Killer::Zone);
                assert_eq!(entry.weapon, KillCause::Zone);
                assert_eq!(entry.victim_id, Uuid::from_u128(2));
                assert_eq!(entry.timestamp, 30);
            }
            other => panic!("unexpected event {:?}", other),
        }

        // Dead players take no further damage and produce no more kill logs
        zone.apply_damage(&mut players, 40, &mut events);
        assert_eq!(events.len(), 1);
    }
}
