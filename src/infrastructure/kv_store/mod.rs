pub mod file;
pub mod memory;

use crate::domain::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

pub const CREDENTIAL_KEY: &str = "hf-api-token";
pub const HISTORY_KEY: &str = "sketch-history";
pub const THEME_KEY: &str = "theme";

/// String-valued key-value storage with localStorage semantics.
///
/// Calls are synchronous and independent: nothing spans a `get` and a later
/// `set`, so callers doing read-modify-write own the interleaving hazard.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}
