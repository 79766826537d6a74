//! Combat system - weapons, projectiles, damage and kill attribution

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::{EffectEvent, EffectType, KillCause, KillLogEntry, Killer, ServerMsg};

use super::obstacles::ObstacleField;
use super::physics::PhysicsSystem;
use super::player::Player;
use super::ActionRejected;

/// Probe size used when testing projectiles against obstacles
const PROJECTILE_OBSTACLE_PROBE: f32 = 4.0;

/// Weapons a player can hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    #[default]
    Pistol,
    Rifle,
    Shotgun,
    Sniper,
}

impl WeaponType {
    /// Tracer color sent to clients
    pub fn tracer_color(self) -> u32 {
        match self {
            WeaponType::Sniper => 0xff0000,
            WeaponType::Shotgun => 0xffa500,
            WeaponType::Pistol | WeaponType::Rifle => 0xffff00,
        }
    }

    pub fn passes_through_obstacles(self) -> bool {
        self == WeaponType::Sniper
    }
}

/// Static weapon profile
#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    /// Damage per projectile
    pub damage: f32,
    /// Minimum time between shots (milliseconds)
    pub fire_rate_ms: u64,
    /// Projectiles spawned per trigger pull
    pub pellet_count: u32,
    /// Total angular spread (radians)
    pub spread: f32,
    pub projectile_speed: f32,
    pub ammo_per_shot: u32,
    /// Max distance travelled before the projectile expires
    pub range: f32,
}

impl WeaponStats {
    pub fn for_type(weapon: WeaponType) -> Self {
        match weapon {
            WeaponType::Pistol => Self {
                damage: 15.0,
                fire_rate_ms: 400,
                pellet_count: 1,
                spread: 0.0,
                projectile_speed: 500.0,
                ammo_per_shot: 1,
                range: 500.0,
            },
            WeaponType::Rifle => Self {
                damage: 20.0,
                fire_rate_ms: 150,
                pellet_count: 1,
                spread: 0.05,
                projectile_speed: 600.0,
                ammo_per_shot: 1,
                range: 800.0,
            },
            WeaponType::Shotgun => Self {
                damage: 10.0,
                fire_rate_ms: 800,
                pellet_count: 8,
                spread: 0.4,
                projectile_speed: 400.0,
                ammo_per_shot: 5,
                range: 300.0,
            },
            WeaponType::Sniper => Self {
                damage: 80.0,
                fire_rate_ms: 1500,
                pellet_count: 1,
                spread: 0.0,
                projectile_speed: 1200.0,
                ammo_per_shot: 10,
                range: 2000.0,
            },
        }
    }
}

/// Active projectile in the game
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub id: u64,
    pub owner_id: Uuid,
    pub weapon: WeaponType,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub damage: f32,
    pub speed: f32,
    pub color: u32,
    pub max_range: f32,
    pub traveled_distance: f32,
    pub can_pass_through_obstacles: bool,
}

impl Projectile {
    /// Move along the heading, returns false once out of the world or out of range
    fn advance(&mut self, dt: f32, world_width: f32, world_height: f32) -> bool {
        let step = self.speed * dt;
        self.x += self.angle.cos() * step;
        self.y += self.angle.sin() * step;
        self.traveled_distance += step;

        let in_bounds = self.x >= 0.0 && self.x <= world_width && self.y >= 0.0 && self.y <= world_height;
        in_bounds && self.traveled_distance <= self.max_range
    }
}

/// Owns every live projectile, keyed by a monotonically increasing id
#[derive(Debug, Default)]
pub struct CombatSystem {
    projectiles: BTreeMap<u64, Projectile>,
    next_id: u64,
}

impl CombatSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }

    /// Check whether a shot would be accepted given the last accepted shot time
    pub fn can_fire(shooter: &Player, last_shot_ms: Option<u64>, now_ms: u64) -> Result<WeaponStats, ActionRejected> {
        if !shooter.alive {
            return Err(ActionRejected::Dead);
        }

        let stats = WeaponStats::for_type(shooter.active_weapon);
        if let Some(last) = last_shot_ms {
            if now_ms.saturating_sub(last) < stats.fire_rate_ms {
                return Err(ActionRejected::Cooldown);
            }
        }

        if shooter.inventory.ammo < stats.ammo_per_shot {
            return Err(ActionRejected::OutOfAmmo);
        }

        Ok(stats)
    }

    /// Fire the shooter's active weapon. Phase gating is the caller's job.
    ///
    /// On success the ammo is debited, a muzzle flash is queued and one
    /// projectile per pellet is spawned with an independent spread offset.
    pub fn fire<R: Rng>(
        &mut self,
        shooter: &mut Player,
        angle: f32,
        last_shot_ms: Option<u64>,
        now_ms: u64,
        rng: &mut R,
        events: &mut Vec<ServerMsg>,
    ) -> Result<(), ActionRejected> {
        let stats = Self::can_fire(shooter, last_shot_ms, now_ms)?;
        let weapon = shooter.active_weapon;

        shooter.inventory.ammo -= stats.ammo_per_shot;

        events.push(ServerMsg::EffectEvent(EffectEvent {
            x: shooter.x,
            y: shooter.y,
            effect: EffectType::MuzzleFlash,
        }));

        for _ in 0..stats.pellet_count {
            let offset = (rng.gen::<f32>() - 0.5) * stats.spread;
            let id = self.next_id;
            self.next_id += 1;

            self.projectiles.insert(
                id,
                Projectile {
                    id,
                    owner_id: shooter.id,
                    weapon,
                    x: shooter.x,
                    y: shooter.y,
                    angle: angle + offset,
                    damage: stats.damage,
                    speed: stats.projectile_speed,
                    color: weapon.tracer_color(),
                    max_range: stats.range,
                    traveled_distance: 0.0,
                    can_pass_through_obstacles: weapon.passes_through_obstacles(),
                },
            );
        }

        Ok(())
    }

    /// Advance every projectile one tick and resolve obstacle and player hits.
    ///
    /// A projectile is removed on its first hit, so it damages at most one
    /// player. Players are tested in roster order.
    pub fn update(
        &mut self,
        dt: f32,
        players: &mut BTreeMap<Uuid, Player>,
        obstacles: &ObstacleField,
        config: &GameConfig,
        now_ms: u64,
        events: &mut Vec<ServerMsg>,
    ) {
        let hit_radius = (config.player_size + config.projectile_size) / 2.0;

        self.projectiles.retain(|_, projectile| {
            if !projectile.advance(dt, config.world_width, config.world_height) {
                return false;
            }

            if !projectile.can_pass_through_obstacles
                && obstacles.collides(projectile.x, projectile.y, PROJECTILE_OBSTACLE_PROBE)
            {
                events.push(ServerMsg::EffectEvent(EffectEvent {
                    x: projectile.x,
                    y: projectile.y,
                    effect: EffectType::Sparks,
                }));
                return false;
            }

            let target = players.values_mut().find(|p| {
                p.alive
                    && p.id != projectile.owner_id
                    && PhysicsSystem::circles_overlap(projectile.x, projectile.y, p.x, p.y, hit_radius)
            });

            let Some(target) = target else {
                return true;
            };

            let victim_id = target.id;
            let killed = target.take_damage(projectile.damage);
            events.push(ServerMsg::EffectEvent(EffectEvent {
                x: projectile.x,
                y: projectile.y,
                effect: EffectType::Blood,
            }));

            if killed {
                if let Some(shooter) = players.get_mut(&projectile.owner_id) {
                    shooter.kills += 1;
                }
                debug!(
                    killer_id = %projectile.owner_id,
                    victim_id = %victim_id,
                    weapon = ?projectile.weapon,
                    "Player eliminated"
                );
                events.push(ServerMsg::KillLog(KillLogEntry {
                    killer_id: Killer::Player(projectile.owner_id),
                    victim_id,
                    weapon: KillCause::from(projectile.weapon),
                    timestamp: now_ms,
                }));
            }

            false
        });
    }
}
