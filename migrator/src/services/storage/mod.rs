//! Account persistence backends
//!
//! The whole account collection is the unit of durability: backends load it
//! wholesale and save it wholesale. That is fine for tens of saved accounts
//! and would need a keyed store for thousands.

mod file_backend;
mod memory_backend;

pub use file_backend::JsonFileBackend;
pub use memory_backend::InMemoryBackend;

use async_trait::async_trait;

use crate::features::accounts::Account;
use crate::services::errors::StorageError;

/// Durable home of the saved account collection
#[async_trait]
pub trait AccountBackend: Send + Sync {
    /// Read the full collection; an absent store is an empty collection
    async fn load(&self) -> Result<Vec<Account>, StorageError>;

    /// Replace the full collection
    async fn save(&self, accounts: &[Account]) -> Result<(), StorageError>;

    /// Get the name of the storage backend
    fn storage_name(&self) -> &'static str;
}

pub(crate) fn encode(accounts: &[Account]) -> Result<String, StorageError> {
    serde_json::to_string_pretty(accounts).map_err(|e| StorageError::Serialization {
        reason: e.to_string(),
    })
}

pub(crate) fn decode(contents: &str) -> Result<Vec<Account>, StorageError> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(contents).map_err(|e| StorageError::Corrupt {
        reason: e.to_string(),
    })
}
