use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Platform operations issued by the resource client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiOperation {
    GetTenant,
    PutTenant,
    QueryVenues,
    QueryAps,
    QueryWifiNetworks,
}

impl ApiOperation {
    /// Operations that send the `x-rks-tenantid` acting-tenant header
    pub fn uses_acting_tenant(&self) -> bool {
        matches!(
            self,
            ApiOperation::QueryVenues | ApiOperation::QueryAps | ApiOperation::QueryWifiNetworks
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiOperation::GetTenant => "get_tenant",
            ApiOperation::PutTenant => "put_tenant",
            ApiOperation::QueryVenues => "query_venues",
            ApiOperation::QueryAps => "query_aps",
            ApiOperation::QueryWifiNetworks => "query_wifi_networks",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse error classes, decided once when a response is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRegion,
    Credentials,
    Unauthorized,
    Forbidden,
    NotFound,
    Server,
    UnexpectedStatus,
    Transport,
    InvalidResponse,
    Validation,
    Cancelled,
}

/// Errors raised while talking to the management platform
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Invalid region '{region}': expected one of EU, ASIA, NA")]
    InvalidRegion { region: String },

    #[error("Failed to fetch token; check credentials")]
    Credentials,

    #[error("HTTP {status} Unauthorized during {operation}: the access token is invalid or expired")]
    Unauthorized {
        operation: ApiOperation,
        status: u16,
        body: String,
    },

    #[error("HTTP {status} Forbidden during {operation}{}", forbidden_hint(.operation))]
    Forbidden {
        operation: ApiOperation,
        status: u16,
        body: String,
    },

    #[error("HTTP {status} Not Found during {operation}: the endpoint or resource does not exist")]
    NotFound {
        operation: ApiOperation,
        status: u16,
        body: String,
    },

    #[error("HTTP {status} Server Error during {operation}: the platform failed upstream")]
    Server {
        operation: ApiOperation,
        status: u16,
        body: String,
    },

    #[error("HTTP {status} during {operation}: {body}")]
    UnexpectedStatus {
        operation: ApiOperation,
        status: u16,
        body: String,
    },

    #[error("Request for {operation} did not complete: {message}")]
    Transport {
        operation: ApiOperation,
        message: String,
    },

    #[error("Invalid response for {operation}: {message}")]
    InvalidResponse {
        operation: ApiOperation,
        message: String,
    },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Operation cancelled before it started")]
    Cancelled,
}

fn forbidden_hint(operation: &ApiOperation) -> &'static str {
    if operation.uses_acting_tenant() {
        ": check that the x-rks-tenantid header names the account that issued the token"
    } else {
        ": the account is not permitted to access this resource"
    }
}

impl ClientError {
    /// Map a non-2xx HTTP status onto the error taxonomy
    pub fn from_status(operation: ApiOperation, status: u16, body: String) -> Self {
        match status {
            401 => ClientError::Unauthorized {
                operation,
                status,
                body,
            },
            403 => ClientError::Forbidden {
                operation,
                status,
                body,
            },
            404 => ClientError::NotFound {
                operation,
                status,
                body,
            },
            500..=599 => ClientError::Server {
                operation,
                status,
                body,
            },
            _ => ClientError::UnexpectedStatus {
                operation,
                status,
                body,
            },
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ClientError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::InvalidRegion { .. } => ErrorKind::InvalidRegion,
            ClientError::Credentials => ErrorKind::Credentials,
            ClientError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ClientError::Forbidden { .. } => ErrorKind::Forbidden,
            ClientError::NotFound { .. } => ErrorKind::NotFound,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            ClientError::Transport { .. } => ErrorKind::Transport,
            ClientError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            ClientError::Validation { .. } => ErrorKind::Validation,
            ClientError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// HTTP status of the failed exchange, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { status, .. }
            | ClientError::Forbidden { status, .. }
            | ClientError::NotFound { status, .. }
            | ClientError::Server { status, .. }
            | ClientError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of the failed exchange, for diagnostics
    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { body, .. }
            | ClientError::Forbidden { body, .. }
            | ClientError::NotFound { body, .. }
            | ClientError::Server { body, .. }
            | ClientError::UnexpectedStatus { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Transport failures and upstream 5xx may succeed on another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport { .. } | ClientError::Server { .. })
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
