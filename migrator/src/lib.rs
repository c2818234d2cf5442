//! Tenant migration between accounts of a multi-tenant network management
//! platform.
//!
//! `services` holds the platform client, configuration, error types and
//! account persistence. `features` holds the account store and the
//! migration workflow built on top of them.

pub mod features;
pub mod services;

pub use features::accounts::{Account, AccountStore, AccountSummary};
pub use features::migration::{
    MigrationBatchResult, MigrationEvent, MigrationEventHandler, MigrationOrchestrator,
    TenantFailure,
};
pub use services::client::{ClientError, ErrorKind, PlatformClient, Region};
pub use services::config::MigrationConfig;
pub use services::errors::{MigrationError, MigrationResult};
