//! Persistent key-value storage for session state
//!
//! The token store writes through one of these backends so a session survives
//! process restarts. Every backend exposes the same flat, namespaced key space:
//!
//! - [`MemoryStore`]: in-process map, nothing survives a restart
//! - [`FileStore`]: a single JSON object file, rewritten atomically
//! - `KeychainProvider` (`platform` feature): the platform keychain

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Flat string key-value store.
///
/// Implementations must make `remove` idempotent. The batch methods default to
/// one call per key; backends that can apply a batch in one step override them.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Removes every key even if an earlier removal failed; reports the first
    /// failure.
    fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(err) = self.remove(key) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
