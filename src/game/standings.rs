//! Match standings that outlive disconnects

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::player::Player;

/// Leaderboard row for one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub id: Uuid,
    pub name: String,
    pub kills: u32,
    pub alive: bool,
}

impl From<&Player> for Standing {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            kills: player.kills,
            alive: player.alive,
        }
    }
}

/// Kills descending, then name ascending, then id for a total order
pub fn sort_standings(standings: &mut [Standing]) {
    standings.sort_by(|a, b| {
        b.kills
            .cmp(&a.kills)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Freshly computed standings for the current roster
pub fn live_standings(players: &BTreeMap<Uuid, Player>) -> Vec<Standing> {
    let mut standings: Vec<Standing> = players.values().map(Standing::from).collect();
    sort_standings(&mut standings);
    standings
}

/// Participants of the current match, keyed by player id
#[derive(Debug, Default)]
pub struct StandingsTracker {
    entries: BTreeMap<Uuid, Standing>,
}

impl StandingsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking everyone on the roster (match start)
    pub fn seed(&mut self, players: &BTreeMap<Uuid, Player>) {
        self.entries = players
            .values()
            .map(|p| (p.id, Standing::from(p)))
            .collect();
    }

    /// Mirror kills, name and alive flag of tracked players still connected
    pub fn sync(&mut self, players: &BTreeMap<Uuid, Player>) {
        for (id, entry) in self.entries.iter_mut() {
            if let Some(player) = players.get(id) {
                entry.kills = player.kills;
                entry.name.clone_from(&player.name);
                entry.alive = player.alive;
            }
        }
    }

    /// Keep a departing participant's record, marked dead
    pub fn retire(&mut self, player: &Player) {
        if let Some(entry) = self.entries.get_mut(&player.id) {
            entry.kills = player.kills;
            entry.name.clone_from(&player.name);
            entry.alive = false;
        }
    }

    pub fn remove(&mut self, id: &Uuid) {
        self.entries.remove(id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked standings in leaderboard order
    pub fn sorted(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self.entries.values().cloned().collect();
        sort_standings(&mut standings);
        standings
    }
}
