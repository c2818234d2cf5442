use serde::{Deserialize, Serialize};

use crate::services::client::errors::ErrorKind;

/// Why a single tenant did not migrate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantFailure {
    pub tenant_id: String,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

/// Aggregate outcome of one `migrate` call
///
/// Every requested tenant id lands in exactly one of `migrated_tenants`
/// or `failed_tenants`, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationBatchResult {
    pub success: bool,
    pub message: String,
    pub migrated_tenants: Vec<String>,
    pub failed_tenants: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TenantFailure>,
}

impl MigrationBatchResult {
    pub fn from_outcomes(migrated_tenants: Vec<String>, failures: Vec<TenantFailure>) -> Self {
        let failed_tenants: Vec<String> = failures.iter().map(|f| f.tenant_id.clone()).collect();
        let success = failed_tenants.is_empty();
        let message = if success {
            format!("Successfully migrated {} tenant(s)", migrated_tenants.len())
        } else {
            format!("Migration completed with {} failure(s)", failed_tenants.len())
        };

        Self {
            success,
            message,
            migrated_tenants,
            failed_tenants,
            failures,
        }
    }

    pub fn total(&self) -> usize {
        self.migrated_tenants.len() + self.failed_tenants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(tenant_id: &str) -> TenantFailure {
        TenantFailure {
            tenant_id: tenant_id.to_string(),
            kind: ErrorKind::NotFound,
            status: Some(404),
            message: "not found".to_string(),
        }
    }

    #[test]
    fn test_all_migrated_message() {
        let result = MigrationBatchResult::from_outcomes(vec!["t1".into(), "t2".into()], vec![]);
        assert!(result.success);
        assert_eq!(result.message, "Successfully migrated 2 tenant(s)");

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("failures").is_none());
        assert_eq!(json["migratedTenants"], serde_json::json!(["t1", "t2"]));
    }

    #[test]
    fn test_failures_drive_success_and_message() {
        let result = MigrationBatchResult::from_outcomes(vec!["t1".into()], vec![failure("t2")]);
        assert!(!result.success);
        assert_eq!(result.failed_tenants, vec!["t2"]);
        assert_eq!(result.message, "Migration completed with 1 failure(s)");
        assert_eq!(result.total(), 2);
    }
}
