use std::time::Duration;

use crate::error::ConfigError;
use crate::history::DEFAULT_UNDO_CAPACITY;
use crate::types::{Difficulty, Player};

pub const DEFAULT_ROOM: &str = "default";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Settings of one local game controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Side played by the computer; `None` for two humans.
    pub ai_side: Option<Player>,
    pub difficulty: Difficulty,
    /// Side to move after a new game.
    pub start_player: Player,
    pub settle_delay: Duration,
    pub auto_pass_delay: Duration,
    pub ai_delay: Duration,
    pub undo_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            ai_side: None,
            difficulty: Difficulty::Easy,
            start_player: Player::Black,
            settle_delay: Duration::from_millis(360),
            auto_pass_delay: Duration::from_millis(1000),
            ai_delay: Duration::from_millis(1000),
            undo_capacity: DEFAULT_UNDO_CAPACITY,
        }
    }
}

impl ControllerConfig {
    /// All delays zero; tasks become due on the next `advance`.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            auto_pass_delay: Duration::ZERO,
            ai_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_ai(mut self, side: Option<Player>, difficulty: Difficulty) -> Self {
        self.ai_side = side;
        self.difficulty = difficulty;
        self
    }
}

/// Parses an AI side setting: `none`, `black` or `white`.
pub fn parse_ai_side(value: &str) -> Result<Option<Player>, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "none" => Ok(None),
        other => other.parse::<Player>().map(Some),
    }
}

/// Relay server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Room used when a join names none.
    pub default_room: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_room: DEFAULT_ROOM.to_string(),
        }
    }
}

impl RelayConfig {
    /// Reads `RELAY_HOST`, `PORT` and `RELAY_DEFAULT_ROOM`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("RELAY_HOST").filter(|v| !v.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    key: "PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Some(room) = lookup("RELAY_DEFAULT_ROOM").filter(|v| !v.trim().is_empty()) {
            config.default_room = room.trim().to_string();
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
