use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::database::DEFAULT_FETCH_LIMIT;

pub const DEFAULT_USER_ID: &str = "local-user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncubateConfig {
    // Storage
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_store_queue_capacity")]
    pub store_queue_capacity: usize,

    // Insights
    #[serde(default = "default_insight_window_days")]
    pub insight_window_days: i64,
    #[serde(default = "default_true")]
    pub enable_demo_fallback: bool,

    // Conversation pacing (presentation only)
    #[serde(default = "default_pacing_min_ms")]
    pub pacing_min_ms: u64,
    #[serde(default = "default_pacing_max_ms")]
    pub pacing_max_ms: u64,

    // Fixed seed for reproducible conversations; random when unset
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_database_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Incubate")
        .join("db.sqlite")
        .to_string_lossy()
        .into_owned()
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}

fn default_store_queue_capacity() -> usize {
    64
}

fn default_insight_window_days() -> i64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_pacing_min_ms() -> u64 {
    1000
}

fn default_pacing_max_ms() -> u64 {
    3000
}

impl Default for IncubateConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            user_id: default_user_id(),
            fetch_limit: default_fetch_limit(),
            store_queue_capacity: default_store_queue_capacity(),
            insight_window_days: default_insight_window_days(),
            enable_demo_fallback: true,
            pacing_min_ms: default_pacing_min_ms(),
            pacing_max_ms: default_pacing_max_ms(),
            rng_seed: None,
        }
    }
}

impl IncubateConfig {
    /// Get the directory containing the executable
    fn get_base_dir() -> PathBuf {
        match std::env::current_exe() {
            Ok(exe_path) => exe_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
            Err(_) => PathBuf::from("."),
        }
    }

    /// Get the path to the config file (relative to executable)
    pub fn config_path() -> PathBuf {
        Self::get_base_dir().join("incubate_config.toml")
    }

    /// Load config from incubate_config.toml (next to executable), falling back
    /// to defaults + env vars
    pub fn load() -> Self {
        let path = Self::config_path();

        if let Ok(contents) = fs::read_to_string(&path) {
            match toml::from_str::<IncubateConfig>(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    return config.apply_env();
                }
                Err(e) => {
                    tracing::error!("Failed to parse {:?}: {}", path, e);
                }
            }
        }

        tracing::warn!("No config file found, using defaults + env vars");
        Self::from_env()
    }

    /// Save config to file (next to executable)
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, toml_string)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Environment variables win over file values.
    pub fn apply_env(mut self) -> Self {
        if let Ok(path) = env::var("INCUBATE_DATABASE_PATH") {
            if !path.trim().is_empty() {
                self.database_path = path;
            }
        }

        if let Ok(user) = env::var("INCUBATE_USER_ID") {
            if !user.trim().is_empty() {
                self.user_id = user;
            }
        }

        if let Ok(limit) = env::var("INCUBATE_FETCH_LIMIT") {
            if let Ok(limit) = limit.parse() {
                self.fetch_limit = limit;
            }
        }

        if let Ok(capacity) = env::var("INCUBATE_STORE_QUEUE_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                self.store_queue_capacity = capacity;
            }
        }

        if let Ok(enabled) = env::var("INCUBATE_ENABLE_DEMO_FALLBACK") {
            self.enable_demo_fallback = parse_flag(&enabled);
        }

        if let Ok(ms) = env::var("INCUBATE_PACING_MIN_MS") {
            if let Ok(ms) = ms.parse() {
                self.pacing_min_ms = ms;
            }
        }

        if let Ok(ms) = env::var("INCUBATE_PACING_MAX_MS") {
            if let Ok(ms) = ms.parse() {
                self.pacing_max_ms = ms;
            }
        }

        if let Ok(seed) = env::var("INCUBATE_RNG_SEED") {
            if let Ok(seed) = seed.parse() {
                self.rng_seed = Some(seed);
            }
        }

        self
    }

    /// Pacing bounds with min <= max guaranteed.
    pub fn pacing_range_ms(&self) -> (u64, u64) {
        let min = self.pacing_min_ms.min(self.pacing_max_ms);
        let max = self.pacing_min_ms.max(self.pacing_max_ms);
        (min, max)
    }
}

fn parse_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("1")
        || raw.eq_ignore_ascii_case("true")
        || raw.eq_ignore_ascii_case("yes")
}
