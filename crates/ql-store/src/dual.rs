//! Primary + fallback persistence behind the engine's [`StateStore`] seam.
//!
//! Load prefers the primary store and falls back to the cookie jar when the
//! primary is missing, unreadable or holds a corrupt document. Save writes
//! both independently: a primary failure is returned, a fallback failure is
//! only logged. The two copies may diverge.

use std::path::Path;

use ql_core::{PersistError, StateDocument, StateStore};

use crate::cookie::CookieJar;
use crate::error::Result;
use crate::kv::KeyValueStore;
use crate::sqlite::SqliteStore;

pub const DATABASE_FILE: &str = "state.db";
pub const COOKIE_FILE: &str = "cookies.txt";

pub struct DualStore {
    primary: Box<dyn KeyValueStore>,
    fallback: Box<dyn KeyValueStore>,
    key: String,
}

impl DualStore {
    pub fn new(
        primary: Box<dyn KeyValueStore>,
        fallback: Box<dyn KeyValueStore>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            primary,
            fallback,
            key: key.into(),
        }
    }

    /// SQLite primary and cookie-jar fallback under `dir`.
    pub fn open(dir: &Path, key: &str, cookie_expiry_days: i64) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let primary = SqliteStore::open(&dir.join(DATABASE_FILE))?;
        let fallback = CookieJar::new(dir.join(COOKIE_FILE), cookie_expiry_days);
        Ok(Self::new(Box::new(primary), Box::new(fallback), key))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn load_from(store: &dyn KeyValueStore, key: &str, which: &str) -> Option<StateDocument> {
        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(store = which, "no stored state");
                return None;
            }
            Err(e) => {
                tracing::warn!(store = which, "state read failed: {e}");
                return None;
            }
        };
        match StateDocument::from_json(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(store = which, "stored state is corrupt, ignoring: {e}");
                None
            }
        }
    }
}

impl StateStore for DualStore {
    fn load(&mut self) -> Option<StateDocument> {
        Self::load_from(self.primary.as_ref(), &self.key, "primary")
            .or_else(|| Self::load_from(self.fallback.as_ref(), &self.key, "fallback"))
    }

    fn save(&mut self, doc: &StateDocument) -> std::result::Result<(), PersistError> {
        let json = doc
            .to_json()
            .map_err(|e| PersistError::Serialization(e.to_string()))?;

        let primary = self.primary.set(&self.key, &json);
        if let Err(e) = self.fallback.set(&self.key, &json) {
            tracing::warn!("fallback state save failed: {e}");
        }
        primary.map_err(PersistError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use ql_core::{Clock, FixedClock};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Shared map with a switch that makes every call fail.
    #[derive(Clone, Default)]
    struct Flaky {
        data: Arc<Mutex<HashMap<String, String>>>,
        broken: Arc<Mutex<bool>>,
    }

    impl Flaky {
        fn check(&self) -> Result<()> {
            if *self.broken.lock().unwrap() {
                Err(StoreError::InvalidData("store offline".into()))
            } else {
                Ok(())
            }
        }
    }

    impl KeyValueStore for Flaky {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.check()?;
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.check()?;
            self.data.lock().unwrap().insert(key.into(), value.into());
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.check()?;
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn doc() -> StateDocument {
        let now = FixedClock::at("2026-02-11T03:15:00+05:00").unwrap().now();
        StateDocument::fresh(now, 5, &mut SmallRng::seed_from_u64(42))
    }

    fn pair() -> (DualStore, Flaky, Flaky) {
        let primary = Flaky::default();
        let fallback = Flaky::default();
        let store = DualStore::new(Box::new(primary.clone()), Box::new(fallback.clone()), "k");
        (store, primary, fallback)
    }

    #[test]
    fn test_save_writes_both() {
        let (mut store, primary, fallback) = pair();
        store.save(&doc()).unwrap();
        assert!(primary.data.lock().unwrap().contains_key("k"));
        assert!(fallback.data.lock().unwrap().contains_key("k"));
        assert_eq!(store.load(), Some(doc()));
    }

    #[test]
    fn test_fallback_failure_is_swallowed() {
        let (mut store, _, fallback) = pair();
        *fallback.broken.lock().unwrap() = true;
        assert!(store.save(&doc()).is_ok());
    }

    #[test]
    fn test_primary_failure_surfaces_but_fallback_written() {
        let (mut store, primary, fallback) = pair();
        *primary.broken.lock().unwrap() = true;
        assert!(matches!(store.save(&doc()), Err(PersistError::Unavailable(_))));
        assert!(fallback.data.lock().unwrap().contains_key("k"));
        // primary still unreadable, so load comes from the fallback
        assert_eq!(store.load(), Some(doc()));
    }

    #[test]
    fn test_corrupt_primary_uses_fallback() {
        let (mut store, primary, _) = pair();
        store.save(&doc()).unwrap();
        primary.data.lock().unwrap().insert("k".into(), "{oops".into());
        assert_eq!(store.load(), Some(doc()));
    }

    #[test]
    fn test_both_empty_is_none() {
        let (mut store, _, _) = pair();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = DualStore::open(dir.path(), "quantumLoveState", 30).unwrap();
            store.save(&doc()).unwrap();
        }
        assert!(dir.path().join(DATABASE_FILE).exists());
        assert!(dir.path().join(COOKIE_FILE).exists());

        // wipe the primary; the cookie jar still restores the document
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(dir.path().join(format!("{DATABASE_FILE}{suffix}")));
        }
        let mut store = DualStore::open(dir.path(), "quantumLoveState", 30).unwrap();
        assert_eq!(store.load(), Some(doc()));
    }
}
