//! Migration orchestrator - resolves both accounts, authenticates once per
//! side, then runs the read/transform/write cycle for every requested tenant

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::payload::build_creation_payload;
use super::progress::{LoggingEventHandler, MigrationEvent, MigrationEventHandler};
use super::types::{MigrationBatchResult, TenantFailure};
use crate::features::accounts::{Account, AccountStore};
use crate::services::client::errors::{ClientError, ClientResult};
use crate::services::client::types::VenuesQueryOverrides;
use crate::services::client::PlatformClient;
use crate::services::config::{MigrationConfig, MigrationDefaults};
use crate::services::errors::{AccountRole, ErrorSeverity, MigrationError, MigrationResult};

/// One side of a batch with its resolved API host
struct Side {
    account: Account,
    api_base: String,
}

/// Tokens fetched once and reused for every tenant in the batch
struct Session {
    source_token: String,
    target_token: String,
}

pub struct MigrationOrchestrator {
    store: Arc<AccountStore>,
    defaults: MigrationDefaults,
    max_concurrent_tenants: usize,
    events: Arc<dyn MigrationEventHandler>,
    cancel: CancellationToken,
}

impl MigrationOrchestrator {
    pub fn new(store: Arc<AccountStore>, config: &MigrationConfig) -> Self {
        Self {
            store,
            defaults: config.migration.clone(),
            max_concurrent_tenants: config.concurrency.max_concurrent_tenants.max(1),
            events: Arc::new(LoggingEventHandler),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_event_handler(mut self, events: Arc<dyn MigrationEventHandler>) -> Self {
        self.events = events;
        self
    }

    /// Tenants not yet started when `cancel` fires are recorded as failed
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_concurrency(mut self, max_concurrent_tenants: usize) -> Self {
        self.max_concurrent_tenants = max_concurrent_tenants.max(1);
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn client(&self) -> &PlatformClient {
        self.store.client()
    }

    async fn resolve_side(&self, role: AccountRole, account_id: &str) -> MigrationResult<Side> {
        let account = self
            .store
            .get(account_id)
            .await?
            .ok_or_else(|| MigrationError::UnknownAccount {
                role,
                account_id: account_id.to_string(),
            })?;
        let api_base = self.client().endpoints(account.region)?.api_base;
        Ok(Side { account, api_base })
    }

    /// Migrate `tenant_ids` from the source account to the target account.
    ///
    /// Returns `Err` only when the batch cannot start (unknown account, bad
    /// region, rejected cross-region pair). Per-tenant failures are recorded
    /// in the result. Repeated ids are migrated once, at their first
    /// position, so every distinct id appears in exactly one list.
    #[instrument(skip(self, tenant_ids), fields(tenants = tenant_ids.len()), err)]
    pub async fn migrate(
        &self,
        source_account_id: &str,
        target_account_id: &str,
        tenant_ids: &[String],
    ) -> MigrationResult<MigrationBatchResult> {
        self.run_batch(source_account_id, target_account_id, tenant_ids)
            .await
            .inspect_err(log_abort)
    }

    async fn run_batch(
        &self,
        source_account_id: &str,
        target_account_id: &str,
        tenant_ids: &[String],
    ) -> MigrationResult<MigrationBatchResult> {
        let source = self.resolve_side(AccountRole::Source, source_account_id).await?;
        let target = self.resolve_side(AccountRole::Target, target_account_id).await?;

        if source.account.region != target.account.region && !self.defaults.allow_cross_region {
            return Err(MigrationError::CrossRegion {
                source_region: source.account.region,
                target_region: target.account.region,
            });
        }

        let tenant_ids = distinct_in_order(tenant_ids);

        info!(
            "Starting migration of {} tenant(s) from {} to {}",
            tenant_ids.len(),
            source.account.name,
            target.account.name
        );
        self.events.handle_event(MigrationEvent::Started {
            source_account_id: source.account.id.clone(),
            target_account_id: target.account.id.clone(),
            tenant_count: tenant_ids.len(),
        });

        let session = self.open_session(&source.account, &target.account).await;

        let outcomes: Vec<ClientResult<u64>> = match &session {
            Ok(session) => {
                let (source, target) = (&source, &target);
                stream::iter(&tenant_ids)
                    .map(|tenant_id| async move {
                        let outcome = self.migrate_tenant(source, target, session, tenant_id).await;
                        self.report_outcome(tenant_id, &outcome);
                        outcome
                    })
                    .buffered(self.max_concurrent_tenants)
                    .collect()
                    .await
            }
            Err(e) => {
                warn!("No session for this batch, failing every tenant: {}", e);
                tenant_ids
                    .iter()
                    .map(|tenant_id| {
                        let outcome = Err(e.clone());
                        self.report_outcome(tenant_id, &outcome);
                        outcome
                    })
                    .collect()
            }
        };

        let mut migrated = Vec::new();
        let mut failures = Vec::new();
        for (tenant_id, outcome) in tenant_ids.into_iter().zip(outcomes) {
            match outcome {
                Ok(_) => migrated.push(tenant_id),
                Err(e) => failures.push(TenantFailure {
                    kind: e.kind(),
                    status: e.status(),
                    message: e.to_string(),
                    tenant_id,
                }),
            }
        }

        let result = MigrationBatchResult::from_outcomes(migrated, failures);
        self.events.handle_event(MigrationEvent::Completed {
            success: result.success,
            migrated: result.migrated_tenants.len(),
            failed: result.failed_tenants.len(),
        });
        info!("{}", result.message);
        Ok(result)
    }

    /// Emit the per-tenant outcome event as soon as the tenant finishes
    fn report_outcome(&self, tenant_id: &str, outcome: &ClientResult<u64>) {
        let event = match outcome {
            Ok(venue_count) => MigrationEvent::TenantMigrated {
                tenant_id: tenant_id.to_string(),
                venue_count: *venue_count,
            },
            Err(e) => MigrationEvent::TenantFailed {
                tenant_id: tenant_id.to_string(),
                kind: e.kind(),
                message: e.to_string(),
            },
        };
        self.events.handle_event(event);
    }

    async fn open_session(&self, source: &Account, target: &Account) -> ClientResult<Session> {
        let source_token = self
            .client()
            .fetch_token(
                &source.tenant_id,
                &source.client_id,
                &source.client_secret,
                source.region,
            )
            .await?;
        let target_token = self
            .client()
            .fetch_token(
                &target.tenant_id,
                &target.client_id,
                &target.client_secret,
                target.region,
            )
            .await?;
        Ok(Session {
            source_token,
            target_token,
        })
    }

    /// Read from the source, write to the target; returns the source venue count
    async fn migrate_tenant(
        &self,
        source: &Side,
        target: &Side,
        session: &Session,
        tenant_id: &str,
    ) -> ClientResult<u64> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        if tenant_id.trim().is_empty() {
            return Err(ClientError::validation("tenant_id", "must not be blank"));
        }

        self.events.handle_event(MigrationEvent::TenantStarted {
            tenant_id: tenant_id.to_string(),
        });
        let client = self.client();

        let record = client
            .get_tenant(&source.api_base, tenant_id, &session.source_token)
            .await?;

        // Acting tenant is the token owner, never the tenant being migrated
        let venues = client
            .query_venues(
                &source.api_base,
                &source.account.tenant_id,
                &session.source_token,
                VenuesQueryOverrides::default(),
            )
            .await?;

        let payload = build_creation_payload(&record, &self.defaults, Utc::now().date_naive())?;

        client
            .put_tenant(
                &target.api_base,
                &target.account.tenant_id,
                &session.target_token,
                &payload,
            )
            .await?;

        info!(
            "Tenant {} migrated to {} ({} venue(s) visible on source)",
            tenant_id, target.account.name, venues.total_count
        );
        Ok(venues.total_count)
    }
}

/// First occurrence of each id, in request order
fn distinct_in_order(tenant_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut distinct = Vec::with_capacity(tenant_ids.len());
    for tenant_id in tenant_ids {
        if seen.insert(tenant_id.as_str()) {
            distinct.push(tenant_id.clone());
        } else {
            warn!("Tenant {} requested more than once; migrating it once", tenant_id);
        }
    }
    distinct
}

fn log_abort(e: &MigrationError) {
    match e.severity() {
        ErrorSeverity::Critical | ErrorSeverity::High => error!("Migration aborted: {}", e),
        ErrorSeverity::Medium => warn!("Migration rejected: {}", e),
        ErrorSeverity::Low => info!("Migration not started: {}", e),
    }
}
