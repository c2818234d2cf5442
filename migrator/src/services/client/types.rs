use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tenant document returned by `GET /tenants/{id}`; kept opaque
pub type TenantRecord = serde_json::Value;

/// OAuth client-credentials token response
#[derive(Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Advertised lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Request descriptor for the paginated `*/query` endpoints
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenuesQuery {
    pub fields: Vec<String>,
    pub search_target_fields: Vec<String>,
    pub filters: BTreeMap<String, serde_json::Value>,
    pub sort_field: String,
    pub sort_order: SortOrder,
    /// 1-indexed
    pub page: u32,
    pub page_size: u32,
    pub default_page_size: u32,
    pub total: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for VenuesQuery {
    fn default() -> Self {
        Self {
            fields: [
                "check-all",
                "name",
                "description",
                "city",
                "country",
                "latitude",
                "longitude",
                "status",
                "id",
                "aggregatedApStatus",
                "switches",
                "switchClients",
                "clients",
                "edges",
                "cog",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
            search_target_fields: ["name", "addressLine", "description", "tagList"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
            filters: BTreeMap::new(),
            sort_field: "name".to_string(),
            sort_order: SortOrder::Asc,
            page: 1,
            page_size: 10,
            default_page_size: 10,
            total: 0,
        }
    }
}

/// Caller overrides, merged field-by-field over the default query
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenuesQueryOverrides {
    pub fields: Option<Vec<String>>,
    pub search_target_fields: Option<Vec<String>>,
    pub search_string: Option<String>,
    pub filters: Option<BTreeMap<String, serde_json::Value>>,
    pub sort_field: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl VenuesQuery {
    /// Shallow merge: every provided override replaces the whole field
    pub fn merged(overrides: VenuesQueryOverrides) -> QueryBody {
        let mut query = VenuesQuery::default();
        if let Some(fields) = overrides.fields {
            query.fields = fields;
        }
        if let Some(search_target_fields) = overrides.search_target_fields {
            query.search_target_fields = search_target_fields;
        }
        if let Some(filters) = overrides.filters {
            query.filters = filters;
        }
        if let Some(sort_field) = overrides.sort_field {
            query.sort_field = sort_field;
        }
        if let Some(sort_order) = overrides.sort_order {
            query.sort_order = sort_order;
        }
        if let Some(page) = overrides.page {
            query.page = page;
        }
        if let Some(page_size) = overrides.page_size {
            query.page_size = page_size;
        }

        QueryBody {
            query,
            search_string: overrides.search_string,
        }
    }
}

/// Body posted to a query endpoint
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryBody {
    #[serde(flatten)]
    pub query: VenuesQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_string: Option<String>,
}

/// One page of query results
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenuesQueryResponse {
    pub data: Vec<serde_json::Value>,
    pub total_count: u64,
    pub has_more: bool,
}

/// Wire shape of a query response; `hasMore` is not always sent
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawQueryResponse {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

impl RawQueryResponse {
    pub(crate) fn into_page(self, page: u32, page_size: u32) -> VenuesQueryResponse {
        let total_count = self.total_count.unwrap_or(self.data.len() as u64);
        let seen = u64::from(page) * u64::from(page_size);
        VenuesQueryResponse {
            has_more: self.has_more.unwrap_or(seen < total_count),
            data: self.data,
            total_count,
        }
    }
}

/// Body posted to `/mspCustomers` to create a tenant under an MSP account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TenantCreationPayload {
    pub name: String,
    pub tenant_type: String,
    pub service_effective_date: String,
    pub service_expiration_date: String,
    pub admin_email: String,
    pub admin_firstname: String,
    pub admin_lastname: String,
    pub admin_role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<BTreeMap<String, String>>,
    #[serde(default = "empty_object")]
    pub licenses: serde_json::Value,
    #[serde(default)]
    pub delegations: Vec<serde_json::Value>,
    #[serde(default)]
    pub admin_delegations: Vec<serde_json::Value>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
