//! Application configuration.
//!
//! Values come from `config.toml` (or the file named by `FLASHDECK_CONFIG`),
//! then environment overrides (a `.env` file is honoured), then defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ==================== File Configuration ====================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/flashdeck.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Scheduler tunables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Target recall probability at the due date
    pub desired_retention: f64,
    /// Delay before a card rated Again comes back
    pub again_delay_minutes: i64,
    /// Longest interval the scheduler will hand out
    pub maximum_interval_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            desired_retention: 0.9,
            again_delay_minutes: 10,
            maximum_interval_days: 36500,
        }
    }
}

impl AppConfig {
    /// Load configuration with priority: env > config file > default
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let path = std::env::var("FLASHDECK_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut config = Self::from_file(Path::new(&path));
        config.apply_env_overrides();
        config
    }

    fn from_file(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::info!("No config file at {}, using defaults", path.display());
                return Self::default();
            }
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("DATABASE_PATH") {
            tracing::info!("Using database from DATABASE_PATH env: {}", path);
            self.database.path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("FLASHDECK_ADDR") {
            self.server.addr = addr;
        }
        if let Ok(port) = std::env::var("FLASHDECK_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid FLASHDECK_PORT value: {}", port),
            }
        }
    }

    /// Get the full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.addr, self.server.port)
    }
}

// ==================== Pagination ====================

pub const DEFAULT_PAGE: u32 = 1;

pub const DEFAULT_PER_PAGE: u32 = 20;

pub const MAX_PER_PAGE: u32 = 100;

// ==================== Content Limits ====================

/// Maximum flashcard front length in characters
pub const MAX_FRONT_CHARS: usize = 250;

/// Maximum flashcard back length in characters
pub const MAX_BACK_CHARS: usize = 750;

/// Maximum source text length in characters
pub const MAX_SOURCE_TEXT_CHARS: usize = 10_000;
