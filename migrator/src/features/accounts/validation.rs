use crate::services::client::errors::{ClientError, ClientResult};

/// Shortest tenant id, client id or client secret accepted
pub const MIN_CREDENTIAL_LENGTH: usize = 8;

/// Characters of the tenant id kept in a generated display name
const DISPLAY_NAME_CHARS: usize = 8;

/// Check the three client-credentials inputs before any network call
pub fn validate_credentials(tenant_id: &str, client_id: &str, client_secret: &str) -> ClientResult<()> {
    for (field, value) in [
        ("tenant_id", tenant_id),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ] {
        let trimmed = value.trim();
        if trimmed.chars().count() < MIN_CREDENTIAL_LENGTH {
            return Err(ClientError::validation(
                field,
                format!("must be at least {} characters", MIN_CREDENTIAL_LENGTH),
            ));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ClientError::validation(field, "must not contain whitespace"));
        }
    }
    Ok(())
}

/// Display label derived from a truncated tenant id
pub fn display_name(tenant_id: &str) -> String {
    let short: String = tenant_id.chars().take(DISPLAY_NAME_CHARS).collect();
    if tenant_id.chars().count() > DISPLAY_NAME_CHARS {
        format!("Account {}...", short)
    } else {
        format!("Account {}", short)
    }
}
