use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::client::region::Region;

/// A saved connection to one tenant-management account
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Last fetched bearer token; a cache that can always be re-derived
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub region: Region,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .finish()
    }
}

/// Summary safe to print or return to a UI
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub region: Region,
    pub has_session_token: bool,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            tenant_id: account.tenant_id.clone(),
            region: account.region,
            has_session_token: account.session_token.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::accounts::test_support::sample_account;

    #[test]
    fn test_debug_redacts_secrets() {
        let mut account = sample_account("acct-1", "tenant-aaaa-0001", Region::Europe);
        account.session_token = Some("tok-very-secret".to_string());

        let debug = format!("{:?}", account);
        assert!(!debug.contains(&account.client_secret));
        assert!(!debug.contains("tok-very-secret"));
        assert!(debug.contains("tenant-aaaa-0001"));
    }

    #[test]
    fn test_missing_region_deserializes_as_unset() {
        let account: Account = serde_json::from_str(
            r#"{"id":"a","name":"n","tenantId":"t","clientId":"c","clientSecret":"s"}"#,
        )
        .unwrap();
        assert_eq!(account.region, Region::Unset);
        assert_eq!(account.session_token, None);
    }
}
