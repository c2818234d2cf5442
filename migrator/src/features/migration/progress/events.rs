//! Migration progress events and event handling

use tracing::{info, warn};

use crate::services::client::errors::ErrorKind;

/// Events emitted while a batch runs
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationEvent {
    Started {
        source_account_id: String,
        target_account_id: String,
        tenant_count: usize,
    },
    TenantStarted {
        tenant_id: String,
    },
    TenantMigrated {
        tenant_id: String,
        venue_count: u64,
    },
    TenantFailed {
        tenant_id: String,
        kind: ErrorKind,
        message: String,
    },
    Completed {
        success: bool,
        migrated: usize,
        failed: usize,
    },
}

/// Receives progress events; called from the migrating task
pub trait MigrationEventHandler: Send + Sync {
    fn handle_event(&self, event: MigrationEvent);
}

/// Forwards events to several handlers in registration order
#[derive(Default)]
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn MigrationEventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler<H: MigrationEventHandler + 'static>(&mut self, handler: H) {
        self.handlers.push(Box::new(handler));
    }
}

impl MigrationEventHandler for CompositeEventHandler {
    fn handle_event(&self, event: MigrationEvent) {
        for handler in &self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

/// Writes every event as a log line
pub struct LoggingEventHandler;

impl MigrationEventHandler for LoggingEventHandler {
    fn handle_event(&self, event: MigrationEvent) {
        match event {
            MigrationEvent::Started {
                source_account_id,
                target_account_id,
                tenant_count,
            } => {
                info!(
                    "[Event] Migration started: {} tenant(s) from {} to {}",
                    tenant_count, source_account_id, target_account_id
                );
            }
            MigrationEvent::TenantStarted { tenant_id } => {
                info!("[Event] Tenant {} started", tenant_id);
            }
            MigrationEvent::TenantMigrated {
                tenant_id,
                venue_count,
            } => {
                info!("[Event] Tenant {} migrated ({} venue(s) on source)", tenant_id, venue_count);
            }
            MigrationEvent::TenantFailed {
                tenant_id,
                kind,
                message,
            } => {
                warn!("[Event] Tenant {} failed ({:?}): {}", tenant_id, kind, message);
            }
            MigrationEvent::Completed {
                success,
                migrated,
                failed,
            } => {
                if success {
                    info!("[Event] Migration completed: {} migrated", migrated);
                } else {
                    warn!(
                        "[Event] Migration completed with failures: {} migrated, {} failed",
                        migrated, failed
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<MigrationEvent>>>);

    impl MigrationEventHandler for Recorder {
        fn handle_event(&self, event: MigrationEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_composite_forwards_to_every_handler() {
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let mut composite = CompositeEventHandler::new();
        composite.add_handler(Recorder(first.clone()));
        composite.add_handler(LoggingEventHandler);
        composite.add_handler(Recorder(second.clone()));

        let event = MigrationEvent::TenantStarted {
            tenant_id: "t1".to_string(),
        };
        composite.handle_event(event.clone());

        assert_eq!(*first.lock().unwrap(), vec![event.clone()]);
        assert_eq!(*second.lock().unwrap(), vec![event]);
    }
}
