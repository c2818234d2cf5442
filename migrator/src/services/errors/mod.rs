use thiserror::Error;

use crate::services::client::errors::{ClientError, ErrorKind};
use crate::services::client::region::Region;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Storage error: {source}")]
    Storage {
        #[source]
        source: StorageError,
        context: String,
    },

    #[error("Unknown {role} account: {account_id}")]
    UnknownAccount { role: AccountRole, account_id: String },

    #[error("Cross-region migration rejected: source is in {source_region}, target is in {target_region}")]
    CrossRegion {
        source_region: Region,
        target_region: Region,
    },

    #[error("Configuration error: {field} - {message}")]
    Configuration { field: String, message: String },
}

/// Which side of a migration an account id was supplied for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Source,
    Target,
    Stored,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountRole::Source => write!(f, "source"),
            AccountRole::Target => write!(f, "target"),
            AccountRole::Stored => write!(f, "stored"),
        }
    }
}

/// Persistence failures of the account collection
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {operation} {path} - {reason}")]
    Io {
        operation: String,
        path: String,
        reason: String,
    },

    #[error("Stored account collection is corrupt: {reason}")]
    Corrupt { reason: String },

    #[error("Failed to serialize account collection: {reason}")]
    Serialization { reason: String },
}

impl From<StorageError> for MigrationError {
    fn from(error: StorageError) -> Self {
        MigrationError::Storage {
            source: error,
            context: "Account storage operation failed".to_string(),
        }
    }
}

pub type MigrationResult<T> = Result<T, MigrationError>;

impl MigrationError {
    pub fn with_context(self, context: &str) -> Self {
        match self {
            MigrationError::Storage { source, .. } => MigrationError::Storage {
                source,
                context: context.to_string(),
            },
            other => other,
        }
    }

    /// Taxonomy kind when the failure came from the platform client
    pub fn client_kind(&self) -> Option<ErrorKind> {
        match self {
            MigrationError::Client(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            MigrationError::Client(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Get error severity for logging/alerting purposes
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MigrationError::Client(e) => match e.kind() {
                ErrorKind::Credentials | ErrorKind::Unauthorized | ErrorKind::Forbidden => {
                    ErrorSeverity::High
                }
                ErrorKind::Transport | ErrorKind::Server => ErrorSeverity::Low,
                _ => ErrorSeverity::Medium,
            },
            MigrationError::Storage { source, .. } => match source {
                StorageError::Corrupt { .. } => ErrorSeverity::Critical,
                _ => ErrorSeverity::High,
            },
            MigrationError::Configuration { .. } => ErrorSeverity::High,
            MigrationError::UnknownAccount { .. } | MigrationError::CrossRegion { .. } => {
                ErrorSeverity::Medium
            }
        }
    }

    /// Check if error indicates a temporary condition
    pub fn is_temporary(&self) -> bool {
        matches!(self.client_kind(), Some(ErrorKind::Transport | ErrorKind::Server))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}
