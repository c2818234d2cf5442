use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{decode, encode, AccountBackend};
use crate::features::accounts::Account;
use crate::services::errors::StorageError;

/// Stores the account collection as one pretty-printed JSON array
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, operation: &str, e: std::io::Error) -> StorageError {
        StorageError::Io {
            operation: operation.to_string(),
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl AccountBackend for JsonFileBackend {
    async fn load(&self) -> Result<Vec<Account>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let accounts = decode(&contents)?;
                info!(
                    "Loaded {} account(s) from {}",
                    accounts.len(),
                    self.path.display()
                );
                Ok(accounts)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No account file at {} - starting empty", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(self.io_error("read", e)),
        }
    }

    async fn save(&self, accounts: &[Account]) -> Result<(), StorageError> {
        let contents = encode(accounts)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error("create directory for", e))?;
            }
        }

        // Write beside the target and rename so a crash never leaves half a file
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, contents.as_bytes())
            .await
            .map_err(|e| self.io_error("write", e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error("rename", e))?;

        debug!("Saved {} account(s) to {}", accounts.len(), self.path.display());
        Ok(())
    }

    fn storage_name(&self) -> &'static str {
        "json-file"
    }
}
