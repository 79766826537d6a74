//! Item economy - spawning pickups, pickup effects and medkit use

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::GameConfig;

use super::combat::WeaponType;
use super::obstacles::ObstacleField;
use super::player::Player;
use super::ActionRejected;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Medkit,
    Ammo,
    WeaponRifle,
    WeaponShotgun,
    WeaponSniper,
}

impl ItemType {
    pub const ALL: [ItemType; 5] = [
        ItemType::Medkit,
        ItemType::Ammo,
        ItemType::WeaponRifle,
        ItemType::WeaponShotgun,
        ItemType::WeaponSniper,
    ];
}

#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: u64,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub x: f32,
    pub y: f32,
}

/// Bounded pool of pickups keyed by a monotonically increasing id
#[derive(Debug)]
pub struct ItemSystem {
    items: BTreeMap<u64, Item>,
    next_id: u64,
    max_items: usize,
}

impl ItemSystem {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 0,
            max_items,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Top the pool up to the cap
    pub fn replenish<R: Rng>(&mut self, obstacles: &ObstacleField, config: &GameConfig, rng: &mut R) {
        while self.items.len() < self.max_items {
            let id = self.next_id;
            self.next_id += 1;

            let item_type = ItemType::ALL[rng.gen_range(0..ItemType::ALL.len())];
            let (x, y) = obstacles.find_item_spawn(rng, config.item_size, config.player_size);
            self.items.insert(id, Item { id, item_type, x, y });
        }
    }

    /// Pick up every item the player is touching. Returns how many were taken.
    pub fn collect_pickups(&mut self, player: &mut Player, config: &GameConfig) -> usize {
        if !player.alive {
            return 0;
        }

        let pickup_radius = (config.player_size + config.item_size) / 2.0;
        let before = self.items.len();

        self.items.retain(|_, item| {
            let dx = player.x - item.x;
            let dy = player.y - item.y;
            if dx * dx + dy * dy >= pickup_radius * pickup_radius {
                return true;
            }

            match item.item_type {
                ItemType::Medkit => player.inventory.medkits += 1,
                ItemType::Ammo => player.inventory.ammo += config.ammo_pickup_amount,
                ItemType::WeaponRifle => player.active_weapon = WeaponType::Rifle,
                ItemType::WeaponShotgun => player.active_weapon = WeaponType::Shotgun,
                ItemType::WeaponSniper => player.active_weapon = WeaponType::Sniper,
            }
            false
        });

        before - self.items.len()
    }

    /// Consume a carried medkit to heal, capped at max health
    pub fn use_medkit(player: &mut Player, config: &GameConfig) -> Result<(), ActionRejected> {
        if !player.alive {
            return Err(ActionRejected::Dead);
        }
        if player.inventory.medkits == 0 {
            return Err(ActionRejected::NoMedkits);
        }

        player.inventory.medkits -= 1;
        player.health = (player.health + config.medkit_heal).min(player.max_health);
        Ok(())
    }
}
