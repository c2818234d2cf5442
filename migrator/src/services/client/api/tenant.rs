use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{info, instrument};

use super::send_classified;
use crate::services::client::errors::{ApiOperation, ClientError};
use crate::services::client::types::{TenantCreationPayload, TenantRecord};
use crate::services::client::PlatformClient;

/// Read one tenant's profile document
#[instrument(skip(client, token), err)]
pub async fn get_tenant_impl(
    client: &PlatformClient,
    api_base: &str,
    tenant_id: &str,
    token: &str,
) -> Result<TenantRecord, ClientError> {
    let url = format!("{}/tenants/{}", api_base, tenant_id);
    info!("Fetching tenant {}", tenant_id);

    client
        .retry
        .run("get_tenant", || {
            let request = client
                .http_client
                .get(&url)
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header(ACCEPT, "application/json");
            send_classified(ApiOperation::GetTenant, request)
        })
        .await
}

/// Create (or update) a customer tenant under the account the token belongs to
#[instrument(skip(client, token, payload), fields(tenant_name = %payload.name), err)]
pub async fn put_tenant_impl(
    client: &PlatformClient,
    api_base: &str,
    target_account_tenant_id: &str,
    token: &str,
    payload: &TenantCreationPayload,
) -> Result<TenantRecord, ClientError> {
    let url = format!("{}/mspCustomers", api_base);
    info!(
        "Creating tenant '{}' under account {}",
        payload.name, target_account_tenant_id
    );

    client
        .retry
        .run("put_tenant", || {
            let request = client
                .http_client
                .post(&url)
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header(CONTENT_TYPE, "application/json")
                .json(payload);
            send_classified(ApiOperation::PutTenant, request)
        })
        .await
}
