pub mod orchestrator;
pub mod payload;
pub mod progress;
pub mod types;


pub use orchestrator::MigrationOrchestrator;
pub use payload::build_creation_payload;
pub use progress::{
    CompositeEventHandler, LoggingEventHandler, MigrationEvent, MigrationEventHandler,
};
pub use types::{MigrationBatchResult, TenantFailure};
