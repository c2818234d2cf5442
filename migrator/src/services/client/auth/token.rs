use tracing::{info, instrument, warn};

use crate::services::client::region::Region;
use crate::services::client::types::TokenResponse;
use crate::services::client::{ClientError, PlatformClient};

/// Exchange account credentials for a short-lived bearer token.
///
/// Every failure after region resolution collapses into
/// [`ClientError::Credentials`]; the underlying cause is only logged.
#[instrument(skip(client, client_id, client_secret), err)]
pub async fn fetch_token_impl(
    client: &PlatformClient,
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
    region: Region,
) -> Result<String, ClientError> {
    let endpoints = client.resolver.resolve(region)?;
    let token_url = format!("{}/oauth2/token/{}", endpoints.auth_base, tenant_id);

    info!("Requesting access token for tenant {} in region {}", tenant_id, region);

    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    let response = client
        .http_client
        .post(&token_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| {
            warn!("Token request for tenant {} did not complete: {}", tenant_id, e);
            ClientError::Credentials
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!(
            "Token request for tenant {} rejected with status {}: {}",
            tenant_id, status, error_text
        );
        return Err(ClientError::Credentials);
    }

    let token: TokenResponse = response.json().await.map_err(|e| {
        warn!("Token response for tenant {} was malformed: {}", tenant_id, e);
        ClientError::Credentials
    })?;

    if token.access_token.is_empty() {
        warn!("Token response for tenant {} carried an empty access_token", tenant_id);
        return Err(ClientError::Credentials);
    }

    info!(
        "Access token issued for tenant {} (type: {:?}, expires_in: {:?}s)",
        tenant_id, token.token_type, token.expires_in
    );

    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use crate::services::client::errors::ErrorKind;
    use crate::services::client::region::Region;
    use crate::services::client::test_support::mock_client;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_token_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth2/token/tenant-0001")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_includes("grant_type=client_credentials")
                .body_includes("client_id=client-0001")
                .body_includes("client_secret=secret-0001");
            then.status(200).json_body(json!({
                "access_token": "tok-123",
                "token_type": "Bearer",
                "expires_in": 7200,
                "scope": "read write"
            }));
        });

        let client = mock_client(&server);
        let token = client
            .fetch_token("tenant-0001", "client-0001", "secret-0001", Region::Europe)
            .await
            .unwrap();

        assert_eq!(token, "tok-123");
        mock.assert();
    }

    #[tokio::test]
    async fn test_rejected_credentials_collapse_to_credentials_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/oauth2/token/tenant-0001");
            then.status(401).body(r#"{"error":"invalid_client"}"#);
        });

        let client = mock_client(&server);
        let err = client
            .fetch_token("tenant-0001", "client-0001", "bad-secret", Region::Asia)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Credentials);
        assert_eq!(err.status(), None);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_token_body_is_credentials_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth2/token/tenant-0001");
            then.status(200).body("not json");
        });

        let client = mock_client(&server);
        let err = client
            .fetch_token("tenant-0001", "client-0001", "secret-0001", Region::NorthAmerica)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Credentials);
    }

    #[tokio::test]
    async fn test_empty_access_token_is_credentials_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth2/token/tenant-0001");
            then.status(200).json_body(json!({"access_token": "", "expires_in": 10}));
        });

        let client = mock_client(&server);
        let err = client
            .fetch_token("tenant-0001", "client-0001", "secret-0001", Region::Europe)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Credentials);
    }

    #[tokio::test]
    async fn test_unset_region_fails_before_any_request() {
        let server = MockServer::start();
        let mock = server.mock(|_when, then| {
            then.status(200).json_body(json!({"access_token": "tok"}));
        });

        let client = mock_client(&server);
        let err = client
            .fetch_token("tenant-0001", "client-0001", "secret-0001", Region::Unset)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRegion);
        assert_eq!(mock.calls(), 0);
    }
}
