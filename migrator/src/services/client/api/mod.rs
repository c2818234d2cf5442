// Resource operations against the platform API

pub mod query;
pub mod tenant;

pub use query::{query_aps_impl, query_venues_impl, query_wifi_networks_impl};
pub use tenant::{get_tenant_impl, put_tenant_impl};

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::services::client::errors::{ApiOperation, ClientError, ClientResult};

/// Header naming the account a request acts on behalf of
pub const ACTING_TENANT_HEADER: &str = "x-rks-tenantid";

/// Send one request and classify the response.
///
/// 2xx bodies are decoded into `T` (an empty body decodes as JSON `null`);
/// every other status becomes the matching [`ClientError`] carrying the
/// status and the raw body text.
pub(crate) async fn send_classified<T: DeserializeOwned>(
    operation: ApiOperation,
    request: RequestBuilder,
) -> ClientResult<T> {
    let response = request.send().await.map_err(|e| ClientError::Transport {
        operation,
        message: e.to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| ClientError::Transport {
        operation,
        message: format!("Failed to read response body: {}", e),
    })?;

    if status.is_success() {
        debug!("{} succeeded with status {}: {}", operation, status, body);
        let text = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(text).map_err(|e| ClientError::InvalidResponse {
            operation,
            message: e.to_string(),
        })
    } else {
        error!("{} failed with status {}: {}", operation, status, body);
        Err(ClientError::from_status(operation, status.as_u16(), body))
    }
}
