//! Paginated `*/query` endpoints.
//!
//! These calls act on behalf of an account through the acting-tenant header.
//! The header must carry the tenant id of the account whose token
//! authenticates the request, never the id of a tenant being read or
//! migrated; the platform answers 403 otherwise.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{info, instrument};

use super::{send_classified, ACTING_TENANT_HEADER};
use crate::services::client::errors::{ApiOperation, ClientError};
use crate::services::client::types::{
    RawQueryResponse, VenuesQuery, VenuesQueryOverrides, VenuesQueryResponse,
};
use crate::services::client::PlatformClient;

async fn acting_tenant_query(
    client: &PlatformClient,
    operation: ApiOperation,
    url: String,
    acting_tenant_id: &str,
    token: &str,
    overrides: VenuesQueryOverrides,
) -> Result<VenuesQueryResponse, ClientError> {
    let body = VenuesQuery::merged(overrides);
    let (page, page_size) = (body.query.page, body.query.page_size);

    let raw: RawQueryResponse = client
        .retry
        .run(operation.as_str(), || {
            let request = client
                .http_client
                .post(&url)
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header(CONTENT_TYPE, "application/json")
                .header(ACTING_TENANT_HEADER, acting_tenant_id)
                .json(&body);
            send_classified(operation, request)
        })
        .await?;

    let response = raw.into_page(page, page_size);
    info!(
        "{} returned {} of {} records (page {}, has_more: {})",
        operation,
        response.data.len(),
        response.total_count,
        page,
        response.has_more
    );
    Ok(response)
}

/// Query venues visible to the acting account
#[instrument(skip(client, token, overrides), err)]
pub async fn query_venues_impl(
    client: &PlatformClient,
    api_base: &str,
    acting_tenant_id: &str,
    token: &str,
    overrides: VenuesQueryOverrides,
) -> Result<VenuesQueryResponse, ClientError> {
    let url = format!("{}/venues/query", api_base);
    acting_tenant_query(
        client,
        ApiOperation::QueryVenues,
        url,
        acting_tenant_id,
        token,
        overrides,
    )
    .await
}

/// Query access points across the acting account's venues
#[instrument(skip(client, token, overrides), err)]
pub async fn query_aps_impl(
    client: &PlatformClient,
    api_base: &str,
    acting_tenant_id: &str,
    token: &str,
    overrides: VenuesQueryOverrides,
) -> Result<VenuesQueryResponse, ClientError> {
    let url = format!("{}/venues/aps/query", api_base);
    acting_tenant_query(
        client,
        ApiOperation::QueryAps,
        url,
        acting_tenant_id,
        token,
        overrides,
    )
    .await
}

/// Query Wi-Fi networks defined for the acting account
#[instrument(skip(client, token, overrides), err)]
pub async fn query_wifi_networks_impl(
    client: &PlatformClient,
    api_base: &str,
    acting_tenant_id: &str,
    token: &str,
    overrides: VenuesQueryOverrides,
) -> Result<VenuesQueryResponse, ClientError> {
    let url = format!("{}/wifiNetworks/query", api_base);
    acting_tenant_query(
        client,
        ApiOperation::QueryWifiNetworks,
        url,
        acting_tenant_id,
        token,
        overrides,
    )
    .await
}
