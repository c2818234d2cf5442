// Client-side access to the multi-tenant management platform
//
// This module provides:
// - Region resolution to authentication and API hosts
// - OAuth client-credentials token exchange
// - Tenant read/create and the paginated venue, AP and Wi-Fi network queries
// - The error taxonomy every non-2xx response is classified into

pub mod api;
pub mod auth;
pub mod errors;
pub mod region;
pub mod retry;
pub mod types;

pub use errors::{ApiOperation, ClientError, ClientResult, ErrorKind};
pub use region::{ApiEndpoints, EndpointResolver, Region};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use types::{
    SortOrder, TenantCreationPayload, TenantRecord, TokenResponse, VenuesQuery,
    VenuesQueryOverrides, VenuesQueryResponse,
};

use reqwest::Client;
use std::time::Duration;
use tracing::instrument;

use crate::services::config::MigrationConfig;
use crate::services::errors::{MigrationError, MigrationResult};

/// Client for the platform's token, tenant and venue endpoints
#[derive(Clone)]
pub struct PlatformClient {
    pub(crate) http_client: Client,
    pub(crate) resolver: EndpointResolver,
    pub(crate) retry: RetryPolicy,
}

impl PlatformClient {
    pub fn new(http_client: Client, resolver: EndpointResolver, retry: RetryPolicy) -> Self {
        Self {
            http_client,
            resolver,
            retry,
        }
    }

    /// Build a client from the network and retry sections of the config
    pub fn from_config(config: &MigrationConfig) -> MigrationResult<Self> {
        let network = &config.network;
        let http_client = Client::builder()
            .user_agent(network.user_agent.clone())
            .connect_timeout(Duration::from_millis(network.connect_timeout_ms))
            .timeout(Duration::from_millis(network.request_timeout_ms))
            .build()
            .map_err(|e| MigrationError::Configuration {
                field: "network".to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let resolver = EndpointResolver::new(network.base_domain.clone())
            .with_override(network.endpoint_override.clone());

        Ok(Self::new(http_client, resolver, config.retry.clone()))
    }

    /// Resolve a region to its hosts; fails before any I/O for `Unset`
    pub fn endpoints(&self, region: Region) -> ClientResult<ApiEndpoints> {
        self.resolver.resolve(region)
    }

    /// Exchange account credentials for a bearer token
    #[instrument(skip(self, client_id, client_secret), err)]
    pub async fn fetch_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        region: Region,
    ) -> ClientResult<String> {
        auth::fetch_token_impl(self, tenant_id, client_id, client_secret, region).await
    }

    /// Read a tenant record
    pub async fn get_tenant(
        &self,
        api_base: &str,
        tenant_id: &str,
        token: &str,
    ) -> ClientResult<TenantRecord> {
        api::get_tenant_impl(self, api_base, tenant_id, token).await
    }

    /// Query venues; `acting_tenant_id` must be the token owner's tenant id
    pub async fn query_venues(
        &self,
        api_base: &str,
        acting_tenant_id: &str,
        token: &str,
        overrides: VenuesQueryOverrides,
    ) -> ClientResult<VenuesQueryResponse> {
        api::query_venues_impl(self, api_base, acting_tenant_id, token, overrides).await
    }

    /// Query access points; same acting-tenant contract as venues
    pub async fn query_aps(
        &self,
        api_base: &str,
        acting_tenant_id: &str,
        token: &str,
        overrides: VenuesQueryOverrides,
    ) -> ClientResult<VenuesQueryResponse> {
        api::query_aps_impl(self, api_base, acting_tenant_id, token, overrides).await
    }

    /// Query Wi-Fi networks; same acting-tenant contract as venues
    pub async fn query_wifi_networks(
        &self,
        api_base: &str,
        acting_tenant_id: &str,
        token: &str,
        overrides: VenuesQueryOverrides,
    ) -> ClientResult<VenuesQueryResponse> {
        api::query_wifi_networks_impl(self, api_base, acting_tenant_id, token, overrides).await
    }

    /// Create a customer tenant under the account that owns `token`
    pub async fn put_tenant(
        &self,
        api_base: &str,
        target_account_tenant_id: &str,
        token: &str,
        payload: &TenantCreationPayload,
    ) -> ClientResult<TenantRecord> {
        api::put_tenant_impl(self, api_base, target_account_tenant_id, token, payload).await
    }
}
