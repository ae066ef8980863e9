use crate::error::Result;

/// String key to string value. Both the primary and the fallback store
/// implement this; [`crate::DualStore`] only talks to the trait.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}
