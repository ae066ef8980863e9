//! Persistence for the Quantum Love state document.
//!
//! A SQLite key-value table is the primary store and a cookie jar file is
//! the fallback; [`DualStore`] drives both behind `ql_core::StateStore`.

pub mod cookie;
pub mod dual;
pub mod error;
pub mod kv;
pub mod paths;
pub mod schema;
pub mod sqlite;

pub use cookie::{Cookie, CookieJar, DEFAULT_EXPIRY_DAYS};
pub use dual::{COOKIE_FILE, DATABASE_FILE, DualStore};
pub use error::{Result, StoreError};
pub use kv::KeyValueStore;
pub use paths::{CONFIG_FILE, DATA_DIR_ENV, data_dir_from_env, default_base_dir};
pub use sqlite::SqliteStore;
