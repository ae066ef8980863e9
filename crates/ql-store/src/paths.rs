use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "QL_DATA_DIR";

pub const CONFIG_FILE: &str = "config.toml";

pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".quantum-love")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// `explicit` if given, else the default under the home directory.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(default_base_dir)
}

/// [`resolve_data_dir`] fed from `QL_DATA_DIR`; blank values are ignored.
pub fn data_dir_from_env() -> PathBuf {
    let explicit = env::var(DATA_DIR_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);
    resolve_data_dir(explicit.as_deref())
}
