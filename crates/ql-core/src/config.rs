//! Engine tunables. Every field has a default, so a partial TOML file is fine.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Multiplier on the day of month in the daily word formula.
pub const DEFAULT_QUANTUM_SEED: u32 = 7;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Key the document is stored under in both stores.
pub const DEFAULT_STORAGE_KEY: &str = "quantumLoveState";

/// Memories at which density saturates at 1.0.
pub const DENSITY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub quantum_seed: u32,
    pub max_attempts: u32,
    pub storage_key: String,
    pub cookie_expiry_days: i64,
    pub chat_delay_min_ms: u64,
    pub chat_delay_max_ms: u64,
    pub metrics_interval_secs: u64,
    pub status_interval_secs: u64,
    pub learning_rate: f64,
    pub training_capacity: usize,
    pub density_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quantum_seed: DEFAULT_QUANTUM_SEED,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            cookie_expiry_days: 30,
            chat_delay_min_ms: 1000,
            chat_delay_max_ms: 2000,
            metrics_interval_secs: 30,
            status_interval_secs: 10,
            learning_rate: 0.1,
            training_capacity: 1000,
            density_capacity: DENSITY_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }

    /// Same config with the simulated chat delay disabled.
    pub fn without_chat_delay(mut self) -> Self {
        self.chat_delay_min_ms = 0;
        self.chat_delay_max_ms = 0;
        self
    }

    /// Delay bounds in milliseconds, ordered even if configured backwards.
    pub fn chat_delay_range(&self) -> RangeInclusive<u64> {
        let lo = self.chat_delay_min_ms.min(self.chat_delay_max_ms);
        let hi = self.chat_delay_min_ms.max(self.chat_delay_max_ms);
        lo..=hi
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs.max(1))
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs.max(1))
    }
}
