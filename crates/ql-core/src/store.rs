//! The persistence seam. The engine only sees [`StateStore`]; concrete
//! backends live in `ql-store`.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::document::StateDocument;

#[derive(Debug, Clone, PartialEq)]
pub enum PersistError {
    /// Backing store missing, unwritable or over quota.
    Unavailable(String),
    /// The document could not be encoded.
    Serialization(String),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            PersistError::Serialization(msg) => write!(f, "serialization failed: {msg}"),
        }
    }
}

impl std::error::Error for PersistError {}

pub trait StateStore: Send {
    /// The stored document, or `None` when nothing usable is stored.
    /// Corrupt documents count as `None`.
    fn load(&mut self) -> Option<StateDocument>;

    fn save(&mut self, doc: &StateDocument) -> Result<(), PersistError>;
}

/// Keeps the last saved document as JSON in memory. Clones share storage,
/// so a test can hold one handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    slot: Arc<Mutex<Option<String>>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw stored JSON, if any.
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    /// Overwrite the raw stored JSON.
    pub fn set_raw(&self, json: impl Into<String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(json.into());
        }
    }

    /// Make subsequent saves fail with [`PersistError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut f) = self.fail_saves.lock() {
            *f = failing;
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&mut self) -> Option<StateDocument> {
        let raw = self.raw()?;
        match StateDocument::from_json(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("stored state is corrupt, ignoring: {e}");
                None
            }
        }
    }

    fn save(&mut self, doc: &StateDocument) -> Result<(), PersistError> {
        if self.fail_saves.lock().map(|f| *f).unwrap_or(false) {
            return Err(PersistError::Unavailable("memory store set to fail".into()));
        }
        let json = doc
            .to_json()
            .map_err(|e| PersistError::Serialization(e.to_string()))?;
        self.set_raw(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{Clock, FixedClock};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn doc() -> StateDocument {
        let now = FixedClock::at("2026-02-11T03:15:00+00:00").unwrap().now();
        StateDocument::fresh(now, 5, &mut SmallRng::seed_from_u64(7))
    }

    #[test]
    fn test_empty_store_loads_none() {
        assert!(MemoryStateStore::new().load().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStateStore::new();
        let d = doc();
        store.save(&d).unwrap();
        assert_eq!(store.load(), Some(d));
    }

    #[test]
    fn test_corrupt_is_none() {
        let mut store = MemoryStateStore::new();
        store.set_raw("{\"user\":");
        assert!(store.load().is_none());
    }

    #[test]
    fn test_failing_store() {
        let mut store = MemoryStateStore::new();
        store.set_failing(true);
        assert!(matches!(store.save(&doc()), Err(PersistError::Unavailable(_))));
        assert!(store.raw().is_none());
    }

    #[test]
    fn test_clones_share_slot() {
        let handle = MemoryStateStore::new();
        let mut owned = handle.clone();
        owned.save(&doc()).unwrap();
        assert!(handle.raw().is_some());
    }
}
