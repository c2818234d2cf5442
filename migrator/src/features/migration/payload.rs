//! Reshape a source tenant record into a creation payload for the target
//!
//! Source records arrive with either snake_case or camelCase keys depending
//! on the endpoint revision, so every field is looked up under both.

use chrono::{Duration, NaiveDate};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::services::client::errors::{ClientError, ClientResult};
use crate::services::client::types::{TenantCreationPayload, TenantRecord};
use crate::services::config::MigrationDefaults;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn lookup<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

fn text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    lookup(record, keys)
        .map(scalar_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(record: &Map<String, Value>, field: &str, keys: &[&str]) -> ClientResult<String> {
    text(record, keys).ok_or_else(|| {
        ClientError::validation(field, "missing from the source tenant record")
    })
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Address fields as strings; nulls are dropped
fn coerce_address(value: &Value) -> Option<BTreeMap<String, String>> {
    let Some(fields) = value.as_object() else {
        debug!("Dropping source address that is not an object: {}", value);
        return None;
    };
    let address: BTreeMap<String, String> = fields
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), scalar_to_string(v)))
        .collect();
    (!address.is_empty()).then_some(address)
}

fn array(record: &Map<String, Value>, keys: &[&str]) -> Vec<Value> {
    match lookup(record, keys) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Build the target creation payload from a source tenant record.
///
/// `today` anchors the default service window. The admin role is always
/// the configured one, whatever the source carries.
pub fn build_creation_payload(
    record: &TenantRecord,
    defaults: &MigrationDefaults,
    today: NaiveDate,
) -> ClientResult<TenantCreationPayload> {
    let fields = record
        .as_object()
        .ok_or_else(|| ClientError::validation("tenant", "source tenant record is not an object"))?;

    let name = required(fields, "name", &["name", "tenantName"])?;
    let admin_email = required(fields, "admin_email", &["admin_email", "adminEmail"])?;
    let admin_firstname = required(
        fields,
        "admin_firstname",
        &["admin_firstname", "adminFirstname", "adminFirstName"],
    )?;
    let admin_lastname = required(
        fields,
        "admin_lastname",
        &["admin_lastname", "adminLastname", "adminLastName"],
    )?;

    let effective = text(fields, &["service_effective_date", "serviceEffectiveDate"])
        .unwrap_or_else(|| today.format(DATE_FORMAT).to_string());
    let expiration = match text(fields, &["service_expiration_date", "serviceExpirationDate"]) {
        Some(date) => date,
        None => {
            let start = NaiveDate::parse_from_str(&effective, DATE_FORMAT).unwrap_or(today);
            (start + Duration::days(i64::from(defaults.service_term_days)))
                .format(DATE_FORMAT)
                .to_string()
        }
    };

    Ok(TenantCreationPayload {
        name,
        tenant_type: text(fields, &["tenant_type", "tenantType"])
            .unwrap_or_else(|| defaults.tenant_type.clone()),
        service_effective_date: effective,
        service_expiration_date: expiration,
        admin_email,
        admin_firstname,
        admin_lastname,
        admin_role: defaults.admin_role.clone(),
        address: lookup(fields, &["address"]).and_then(coerce_address),
        licenses: lookup(fields, &["licenses"])
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
        delegations: array(fields, &["delegations"]),
        admin_delegations: array(fields, &["admin_delegations", "adminDelegations"]),
    })
}
