//! The persisted aggregate and its parts.
//!
//! Serialized as one camelCase JSON object. Every section defaults, so a
//! document written by an older build still loads.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    pub user: UserProfile,
    pub quantum_lock: QuantumLock,
    pub memories: MemoryBank,
    pub poetry: PoetryBook,
    pub ai: Companion,
    pub predictions: PredictionBoard,
    pub metrics: Metrics,
    pub system: SystemInfo,
}

impl StateDocument {
    /// A first-run document stamped at `now`.
    pub fn fresh(now: Timestamp, max_attempts: u32, rng: &mut impl Rng) -> Self {
        Self {
            user: UserProfile {
                name: "Your Name".to_string(),
                beloved: "Their Name".to_string(),
                anniversary: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
                quantum_id: quantum_id(now, rng),
            },
            quantum_lock: QuantumLock {
                max_attempts: max_attempts.max(1),
                ..QuantumLock::default()
            },
            memories: MemoryBank::default(),
            poetry: PoetryBook::default(),
            ai: Companion::default(),
            predictions: PredictionBoard {
                last_updated: Some(now),
                ..PredictionBoard::default()
            },
            metrics: Metrics::default(),
            system: SystemInfo {
                first_visit: now,
                total_visits: 1,
                last_visit: now,
                quantum_coherence: true,
                backup_status: "up_to_date".to_string(),
            },
        }
    }

    /// Count one more visit.
    pub fn record_visit(&mut self, now: Timestamp) {
        self.system.total_visits = self.system.total_visits.saturating_add(1);
        self.system.last_visit = now;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// `ql_<millis>_<9 base-36 chars>`.
fn quantum_id(now: Timestamp, rng: &mut impl Rng) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("ql_{}_{suffix}", now.timestamp_millis())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub beloved: String,
    pub anniversary: NaiveDate,
    pub quantum_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuantumLock {
    pub todays_word: String,
    pub todays_hint: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_unlock: Option<Timestamp>,
    pub unlock_streak: u32,
    /// Local date the current word was generated on.
    pub generated_on: Option<NaiveDate>,
}

impl Default for QuantumLock {
    fn default() -> Self {
        Self {
            todays_word: String::new(),
            todays_hint: String::new(),
            attempts: 0,
            max_attempts: crate::config::DEFAULT_MAX_ATTEMPTS,
            last_unlock: None,
            unlock_streak: 0,
            generated_on: None,
        }
    }
}

impl QuantumLock {
    pub fn is_locked_out(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }
}

/// Length class of a memory's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantumState {
    Coherent,
    Entangled,
    Superposition,
    Multiversal,
}

impl QuantumState {
    /// Thresholds at 50, 100 and 200 characters.
    pub fn of(content: &str) -> Self {
        match content.chars().count() {
            0..50 => QuantumState::Coherent,
            50..100 => QuantumState::Entangled,
            100..200 => QuantumState::Superposition,
            _ => QuantumState::Multiversal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuantumState::Coherent => "coherent",
            QuantumState::Entangled => "entangled",
            QuantumState::Superposition => "superposition",
            QuantumState::Multiversal => "multiversal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: Uuid,
    pub content: String,
    pub tags: Vec<String>,
    pub timestamp: Timestamp,
    pub emotional_amplitude: f64,
    pub quantum_state: QuantumState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryBank {
    /// Newest first.
    pub storage: Vec<Memory>,
    pub total: u64,
    pub density: f64,
    pub recall_speed: u32,
    pub compression: String,
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self {
            storage: Vec::new(),
            total: 0,
            density: 0.87,
            recall_speed: 24,
            compression: "lossless".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemAnalysis {
    pub sentiment: Vec<String>,
    pub quantum_state: String,
    pub emotional_amplitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poem {
    pub verse: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<PoemAnalysis>,
    #[serde(default)]
    pub era: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorited_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoetryBook {
    /// Unique by verse text, in the order they were favorited.
    pub favorites: Vec<Poem>,
    pub history: Vec<Poem>,
    /// Newest first.
    pub ai_generated: Vec<Poem>,
    pub personal: Vec<Poem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Companion {
    pub name: String,
    pub personality: String,
    pub conversation_history: Vec<ChatTurn>,
    pub learning_rate: f64,
    pub emotional_intelligence: f64,
}

impl Default for Companion {
    fn default() -> Self {
        Self {
            name: "Noora AI".to_string(),
            personality: "romantic_intelligent".to_string(),
            conversation_history: Vec::new(),
            learning_rate: 0.8,
            emotional_intelligence: 94.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub text: String,
    pub emoji: String,
    /// Percent.
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionBoard {
    pub short_term: Vec<Prediction>,
    pub medium_term: Vec<Prediction>,
    pub long_term: Vec<Prediction>,
    pub accuracy: f64,
    pub last_updated: Option<Timestamp>,
}

impl Default for PredictionBoard {
    fn default() -> Self {
        Self {
            short_term: Vec::new(),
            medium_term: Vec::new(),
            long_term: Vec::new(),
            accuracy: 0.82,
            last_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metrics {
    pub love_amplitude: f64,
    pub entanglement: f64,
    pub coherence: f64,
    pub superposition: u32,
    pub temporal_alignment: String,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            love_amplitude: 0.94,
            entanglement: 0.72,
            coherence: 0.89,
            superposition: 7,
            temporal_alignment: "optimal".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub first_visit: Timestamp,
    pub total_visits: u64,
    pub last_visit: Timestamp,
    pub quantum_coherence: bool,
    pub backup_status: String,
}
