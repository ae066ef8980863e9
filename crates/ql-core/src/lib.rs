//! Quantum Love state and rules engine.
//!
//! Owns one persisted [`StateDocument`] and every rule that mutates it: the
//! daily quantum lock, the memory journal, favourite and generated poetry,
//! companion chat turns, week-ahead predictions and time-of-day metrics.
//! A keyword-bucket classifier scores free text into five categories.
//!
//! Zero I/O. Persistence is reached through [`StateStore`], time through
//! [`Clock`], and static text through [`ContentTables`] loaded from TOML.

pub mod bus;
pub mod chat;
pub mod classifier;
pub mod config;
pub mod content;
pub mod dashboard;
pub mod document;
pub mod engine;
pub mod lock;
pub mod memory;
pub mod metrics;
pub mod moon;
pub mod poetry;
pub mod predict;
pub mod store;
pub mod time;
pub mod tokenizer;

pub use bus::{EngineEvent, NotificationBus, Observer, SubscriptionId};
pub use classifier::{Category, Classifier, Distribution, EmotionPrediction, TrainingRecord};
pub use config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_QUANTUM_SEED, DEFAULT_STORAGE_KEY, EngineConfig};
pub use content::{ContentError, ContentTables, WordEntry};
pub use dashboard::{Chamber, Dashboard, Resonance};
pub use document::{
    ChatTurn, Memory, Metrics, Poem, Prediction, QuantumLock, QuantumState, Role, StateDocument,
};
pub use engine::Engine;
pub use lock::UnlockOutcome;
pub use memory::DEFAULT_LIST_LIMIT;
pub use moon::{MoonPhase, moon_phase};
pub use store::{MemoryStateStore, PersistError, StateStore};
pub use time::{Clock, FixedClock, SystemClock, Timestamp};
