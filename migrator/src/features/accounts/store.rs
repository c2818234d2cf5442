//! Account Store
//!
//! Owns the saved account collection. The collection is loaded from the
//! backend on first access and cached for the life of the store; every
//! mutation rewrites the whole collection. A single async mutex guards
//! load, mutate and save so concurrent callers never double-load or
//! interleave writes.

use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{info, instrument, warn};
use ulid::Ulid;

use super::types::Account;
use super::validation::{display_name, validate_credentials};
use crate::services::client::region::Region;
use crate::services::client::PlatformClient;
use crate::services::errors::{AccountRole, MigrationError, MigrationResult};
use crate::services::storage::AccountBackend;

pub struct AccountStore {
    backend: Arc<dyn AccountBackend>,
    client: PlatformClient,
    cache: Mutex<Option<Vec<Account>>>,
}

impl AccountStore {
    pub fn new(backend: Arc<dyn AccountBackend>, client: PlatformClient) -> Self {
        Self {
            backend,
            client,
            cache: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &PlatformClient {
        &self.client
    }

    /// Lock the cache, loading the collection on first use
    async fn loaded(&self) -> MigrationResult<MappedMutexGuard<'_, Vec<Account>>> {
        let mut guard = self.cache.lock().await;
        if guard.is_none() {
            let accounts = self
                .backend
                .load()
                .await
                .map_err(|e| MigrationError::from(e).with_context("Loading saved accounts"))?;
            info!(
                "Account store initialized from {} backend with {} account(s)",
                self.backend.storage_name(),
                accounts.len()
            );
            *guard = Some(accounts);
        }
        Ok(MutexGuard::map(guard, |cache| cache.get_or_insert_with(Vec::new)))
    }

    /// Validate credentials, fetch an initial token, then persist a new account.
    ///
    /// Nothing is stored when validation, region resolution or the token
    /// exchange fails.
    #[instrument(skip(self, client_id, client_secret), err)]
    pub async fn add(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        region: Region,
    ) -> MigrationResult<Account> {
        validate_credentials(tenant_id, client_id, client_secret)?;
        let (tenant_id, client_id, client_secret) =
            (tenant_id.trim(), client_id.trim(), client_secret.trim());
        self.client.endpoints(region)?;

        let token = self
            .client
            .fetch_token(tenant_id, client_id, client_secret, region)
            .await?;

        let account = Account {
            id: Ulid::new().to_string(),
            name: display_name(tenant_id),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            session_token: Some(token),
            region,
        };

        let mut accounts = self.loaded().await?;
        accounts.push(account.clone());
        if let Err(e) = self.backend.save(&accounts).await {
            accounts.pop();
            return Err(MigrationError::from(e).with_context("Saving new account"));
        }

        info!("Added account {} ({}) in region {}", account.id, account.name, region);
        Ok(account)
    }

    /// Accounts in `region`, in insertion order
    pub async fn list(&self, region: Region) -> MigrationResult<Vec<Account>> {
        let accounts = self.loaded().await?;
        Ok(accounts
            .iter()
            .filter(|account| account.region == region)
            .cloned()
            .collect())
    }

    /// Every saved account, in insertion order
    pub async fn list_all(&self) -> MigrationResult<Vec<Account>> {
        Ok(self.loaded().await?.clone())
    }

    pub async fn get(&self, account_id: &str) -> MigrationResult<Option<Account>> {
        let accounts = self.loaded().await?;
        Ok(accounts.iter().find(|account| account.id == account_id).cloned())
    }

    /// Remove an account; `false` (not an error) when no account matches
    #[instrument(skip(self), err)]
    pub async fn delete(&self, account_id: &str) -> MigrationResult<bool> {
        let mut accounts = self.loaded().await?;
        let Some(position) = accounts.iter().position(|account| account.id == account_id) else {
            info!("No account {} to delete", account_id);
            return Ok(false);
        };

        let removed = accounts.remove(position);
        if let Err(e) = self.backend.save(&accounts).await {
            accounts.insert(position, removed);
            return Err(MigrationError::from(e).with_context("Saving after delete"));
        }

        info!("Deleted account {} ({})", removed.id, removed.name);
        Ok(true)
    }

    /// Fetch a fresh token for a saved account and update its cached copy
    #[instrument(skip(self), err)]
    pub async fn refresh_token(&self, account_id: &str) -> MigrationResult<String> {
        let account = self
            .get(account_id)
            .await?
            .ok_or_else(|| MigrationError::UnknownAccount {
                role: AccountRole::Stored,
                account_id: account_id.to_string(),
            })?;

        let token = self
            .client
            .fetch_token(
                &account.tenant_id,
                &account.client_id,
                &account.client_secret,
                account.region,
            )
            .await?;

        let mut accounts = self.loaded().await?;
        match accounts.iter_mut().find(|stored| stored.id == account_id) {
            Some(stored) => {
                stored.session_token = Some(token.clone());
                self.backend
                    .save(&accounts)
                    .await
                    .map_err(|e| MigrationError::from(e).with_context("Saving refreshed token"))?;
            }
            None => warn!("Account {} was deleted while its token was refreshed", account_id),
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::accounts::test_support::sample_account;
    use crate::services::client::errors::ErrorKind;
    use crate::services::client::test_support::mock_client;
    use crate::services::errors::StorageError;
    use crate::services::storage::InMemoryBackend;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::json;

    fn store_with(server: &MockServer, backend: Arc<InMemoryBackend>) -> AccountStore {
        AccountStore::new(backend, mock_client(server))
    }

    /// Backend whose load takes long enough for callers to pile up behind it
    struct SlowLoadBackend {
        inner: Arc<InMemoryBackend>,
    }

    #[async_trait]
    impl AccountBackend for SlowLoadBackend {
        async fn load(&self) -> Result<Vec<Account>, StorageError> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            self.inner.load().await
        }

        async fn save(&self, accounts: &[Account]) -> Result<(), StorageError> {
            self.inner.save(accounts).await
        }

        fn storage_name(&self) -> &'static str {
            "slow-memory"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_access_loads_once() {
        let server = MockServer::start();
        let inner = Arc::new(
            InMemoryBackend::with_accounts(&[
                sample_account("acct-1", "tenant-aaaa-0001", Region::Europe),
                sample_account("acct-2", "tenant-bbbb-0002", Region::Asia),
            ])
            .unwrap(),
        );
        let store = Arc::new(AccountStore::new(
            Arc::new(SlowLoadBackend {
                inner: inner.clone(),
            }),
            mock_client(&server),
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.list_all().await })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            assert_eq!(task.unwrap().unwrap().len(), 2);
        }

        assert_eq!(inner.load_count(), 1);
        assert_eq!(inner.save_count(), 0);
    }

    #[tokio::test]
    async fn test_add_persists_account_with_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/oauth2/token/tenant-aaaa-0001");
            then.status(200).json_body(json!({"access_token": "tok-1"}));
        });
        let backend = Arc::new(InMemoryBackend::new());
        let store = store_with(&server, backend.clone());

        let account = store
            .add(" tenant-aaaa-0001 ", "client-0001", "secret-0001", Region::Europe)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(account.tenant_id, "tenant-aaaa-0001");
        assert_eq!(account.name, "Account tenant-a...");
        assert_eq!(account.session_token.as_deref(), Some("tok-1"));
        assert_eq!(account.id.len(), 26);
        assert_eq!(backend.save_count(), 1);

        let reloaded = backend.load().await.unwrap();
        assert_eq!(reloaded, vec![account]);
    }

    #[tokio::test]
    async fn test_add_with_rejected_credentials_stores_nothing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth2/token/tenant-aaaa-0001");
            then.status(401);
        });
        let backend = Arc::new(InMemoryBackend::new());
        let store = store_with(&server, backend.clone());

        let err = store
            .add("tenant-aaaa-0001", "client-0001", "secret-0001", Region::Europe)
            .await
            .unwrap_err();

        assert_eq!(err.client_kind(), Some(ErrorKind::Credentials));
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_add_validation_and_region_fail_before_any_request() {
        let server = MockServer::start();
        let mock = server.mock(|_when, then| {
            then.status(200).json_body(json!({"access_token": "tok"}));
        });
        let store = store_with(&server, Arc::new(InMemoryBackend::new()));

        let err = store
            .add("tenant-aaaa-0001", "short", "secret-0001", Region::Europe)
            .await
            .unwrap_err();
        assert_eq!(err.client_kind(), Some(ErrorKind::Validation));

        let err = store
            .add("tenant-aaaa-0001", "client-0001", "secret-0001", Region::Unset)
            .await
            .unwrap_err();
        assert_eq!(err.client_kind(), Some(ErrorKind::InvalidRegion));

        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_region_in_insertion_order() {
        let server = MockServer::start();
        let backend = Arc::new(
            InMemoryBackend::with_accounts(&[
                sample_account("acct-1", "tenant-aaaa-0001", Region::Europe),
                sample_account("acct-2", "tenant-bbbb-0002", Region::Asia),
                sample_account("acct-3", "tenant-cccc-0003", Region::Europe),
            ])
            .unwrap(),
        );
        let store = store_with(&server, backend);

        let ids: Vec<String> = store
            .list(Region::Europe)
            .await
            .unwrap()
            .into_iter()
            .map(|account| account.id)
            .collect();
        assert_eq!(ids, vec!["acct-1", "acct-3"]);
        assert!(store.list(Region::NorthAmerica).await.unwrap().is_empty());
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_id_leaves_store_untouched() {
        let server = MockServer::start();
        let backend = Arc::new(
            InMemoryBackend::with_accounts(&[sample_account(
                "acct-1",
                "tenant-aaaa-0001",
                Region::Europe,
            )])
            .unwrap(),
        );
        let before = backend.document();
        let store = store_with(&server, backend.clone());

        assert!(!store.delete("acct-missing").await.unwrap());
        assert_eq!(backend.document(), before);
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_and_persists() {
        let server = MockServer::start();
        let backend = Arc::new(
            InMemoryBackend::with_accounts(&[
                sample_account("acct-1", "tenant-aaaa-0001", Region::Europe),
                sample_account("acct-2", "tenant-bbbb-0002", Region::Europe),
            ])
            .unwrap(),
        );
        let store = store_with(&server, backend.clone());

        assert!(store.delete("acct-1").await.unwrap());
        assert!(store.get("acct-1").await.unwrap().is_none());

        let persisted = backend.load().await.unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].id, "acct-2");
    }

    #[tokio::test]
    async fn test_refresh_token_updates_saved_account() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth2/token/tenant-aaaa-0001");
            then.status(200).json_body(json!({"access_token": "tok-fresh"}));
        });
        let backend = Arc::new(
            InMemoryBackend::with_accounts(&[sample_account(
                "acct-1",
                "tenant-aaaa-0001",
                Region::Europe,
            )])
            .unwrap(),
        );
        let store = store_with(&server, backend.clone());

        let token = store.refresh_token("acct-1").await.unwrap();
        assert_eq!(token, "tok-fresh");
        assert_eq!(
            backend.load().await.unwrap()[0].session_token.as_deref(),
            Some("tok-fresh")
        );

        assert!(matches!(
            store.refresh_token("acct-missing").await,
            Err(MigrationError::UnknownAccount { .. })
        ));
    }
}
