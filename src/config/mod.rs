//! Configuration module - environment variable parsing and game constants

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated), any origin when unset
    pub client_origin: Option<String>,
    /// Fixed seed for the match RNG, random when unset
    pub match_seed: Option<u64>,
    /// Simulation constants
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:9208".to_string())
        };

        let mut game = GameConfig::default();
        if let Some(tick_rate) = parse_var("TICK_RATE")? {
            if tick_rate == 0 {
                return Err(ConfigError::Invalid("TICK_RATE"));
            }
            game.tick_rate = tick_rate;
        }
        if let Some(min_players) = parse_var("LOBBY_MIN_PLAYERS")? {
            game.lobby_min_players = min_players;
        }
        if let Some(max_items) = parse_var("MAX_ITEMS")? {
            game.max_items = max_items;
        }
        if let Some(countdown) = parse_var::<f32>("COUNTDOWN_SECS")? {
            if !countdown.is_finite() || countdown < 0.0 {
                return Err(ConfigError::Invalid("COUNTDOWN_SECS"));
            }
            game.countdown_duration = countdown;
        }
        if let Some(game_over) = parse_var::<f32>("GAME_OVER_SECS")? {
            if !game_over.is_finite() || game_over < 0.0 {
                return Err(ConfigError::Invalid("GAME_OVER_SECS"));
            }
            game.game_over_duration = game_over;
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            client_origin: env::var("CLIENT_ORIGIN").ok().filter(|s| !s.trim().is_empty()),
            match_seed: parse_var("MATCH_SEED")?,
            game,
        })
    }
}

/// Read an optional variable, failing if it is present but malformed
fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

/// Simulation constants, fixed for the lifetime of the process
#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tick_rate: u32,
    pub world_width: f32,
    pub world_height: f32,
    pub player_size: f32,
    /// Movement speed in units per second
    pub player_speed: f32,
    pub player_max_health: f32,
    pub zone_initial_radius: f32,
    /// Radius lost per second while in game
    pub zone_shrink_rate: f32,
    /// Damage applied once per second outside the zone
    pub zone_damage: f32,
    pub projectile_size: f32,
    pub item_size: f32,
    pub max_items: usize,
    pub lobby_min_players: usize,
    /// Seconds
    pub countdown_duration: f32,
    /// Seconds
    pub game_over_duration: f32,
    pub starting_ammo: u32,
    pub ammo_pickup_amount: u32,
    pub medkit_heal: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            world_width: 3200.0,
            world_height: 2432.0,
            player_size: 32.0,
            player_speed: 250.0,
            player_max_health: 100.0,
            zone_initial_radius: 1536.0,
            zone_shrink_rate: 5.0,
            zone_damage: 10.0,
            projectile_size: 8.0,
            item_size: 16.0,
            max_items: 77,
            lobby_min_players: 2,
            countdown_duration: 10.0,
            game_over_duration: 5.0,
            starting_ammo: 100,
            ammo_pickup_amount: 40,
            medkit_heal: 40.0,
        }
    }
}

impl GameConfig {
    pub fn zone_center(&self) -> (f32, f32) {
        (self.world_width / 2.0, self.world_height / 2.0)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
