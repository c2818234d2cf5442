use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{decode, encode, AccountBackend};
use crate::features::accounts::Account;
use crate::services::errors::StorageError;

/// Keeps the serialized collection in memory; used by tests and dry runs
#[derive(Default)]
pub struct InMemoryBackend {
    document: Mutex<Option<String>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already persisted collection
    pub fn with_accounts(accounts: &[Account]) -> Result<Self, StorageError> {
        Ok(Self {
            document: Mutex::new(Some(encode(accounts)?)),
            loads: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        })
    }

    /// The persisted form, exactly as last saved
    pub fn document(&self) -> Option<String> {
        self.document.lock().ok().and_then(|doc| doc.clone())
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountBackend for InMemoryBackend {
    async fn load(&self) -> Result<Vec<Account>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match self.document() {
            Some(contents) => decode(&contents),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, accounts: &[Account]) -> Result<(), StorageError> {
        let contents = encode(accounts)?;
        let mut document = self.document.lock().map_err(|_| StorageError::Io {
            operation: "write".to_string(),
            path: "memory".to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        *document = Some(contents);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn storage_name(&self) -> &'static str {
        "memory"
    }
}
