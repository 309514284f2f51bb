use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    Account, AccountChanges, AccountFilter, AccountStore, AccountWithPassword, NewAccount,
};
use crate::repos::error::RepoResult;
use crate::services::cache::client::{CacheClient, CacheError, ttl_seconds};

/// Read-through cache in front of another AccountStore.
///
/// - Only `find_by_id` (the per-request gate lookup) is served from cache.
/// - Every mutation deletes the cached entry after the inner store write, so
///   role / active / password changes are visible on the next request.
/// - Cache failures are logged and fall through to the inner store (fail-open);
///   the inner store stays the source of truth.
/// - Password hashes never enter the cache.
/// - A miss only writes back if no mutation ran between its store read and the
///   cache write (`epoch`), so an invalidated entry is never resurrected.
///   This orders requests within one process only.
pub struct CachedAccountStore<C: CacheClient> {
    inner: Arc<dyn AccountStore>,
    cache: C,
    ttl_seconds: u64,
    prefix: String,
    // Bumped by every mutation. Write-backs hold the read side.
    epoch: RwLock<u64>,
}

impl<C: CacheClient> CachedAccountStore<C> {
    pub fn new(inner: Arc<dyn AccountStore>, cache: C, ttl_seconds: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_seconds,
            prefix: "account".to_string(),
            epoch: RwLock::new(0),
        }
    }

    pub fn key(&self, id: Uuid) -> String {
        format!("{}:{}", self.prefix, id)
    }

    async fn cached(&self, id: Uuid) -> Result<Option<Account>, CacheError> {
        let Some(raw) = self.cache.get_string(&self.key(id)).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CacheError::InvalidValue(e.to_string()))
    }

    async fn remember(&self, account: &Account) {
        let value = match serde_json::to_string(account) {
            Ok(v) => v,
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "failed to encode account for cache");
                return;
            }
        };

        if let Err(e) = self
            .cache
            .set_with_ttl(&self.key(account.id), &value, ttl_seconds(self.ttl_seconds))
            .await
        {
            warn!(
                backend = self.cache.backend_name(),
                account_id = %account.id,
                error = %e,
                "account cache write failed"
            );
        }
    }

    // Write back only if nothing was invalidated since `read_epoch`
    async fn remember_if_current(&self, account: &Account, read_epoch: u64) {
        let epoch = self.epoch.read().await;
        if *epoch != read_epoch {
            debug!(account_id = %account.id, "skipping cache write after concurrent mutation");
            return;
        }
        self.remember(account).await;
    }

    async fn invalidate(&self, id: Uuid) {
        let mut epoch = self.epoch.write().await;
        *epoch = epoch.wrapping_add(1);
        self.forget(id).await;
    }

    async fn forget(&self, id: Uuid) {
        if let Err(e) = self.cache.del(&self.key(id)).await {
            warn!(
                backend = self.cache.backend_name(),
                account_id = %id,
                error = %e,
                "account cache invalidation failed"
            );
        }
    }
}

#[async_trait]
impl<C: CacheClient> AccountStore for CachedAccountStore<C> {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Account>> {
        match self.cached(id).await {
            Ok(Some(account)) => {
                debug!(account_id = %id, "account cache hit");
                return Ok(Some(account));
            }
            Ok(None) => {}
            Err(CacheError::InvalidValue(e)) => {
                warn!(account_id = %id, error = %e, "dropping undecodable cache entry");
                self.forget(id).await;
            }
            Err(e) => {
                warn!(
                    backend = self.cache.backend_name(),
                    account_id = %id,
                    error = %e,
                    "account cache read failed, using store"
                );
            }
        }

        let read_epoch = *self.epoch.read().await;
        let account = self.inner.find_by_id(id).await?;
        if let Some(account) = &account {
            self.remember_if_current(account, read_epoch).await;
        }
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        self.inner.find_by_email(email).await
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> RepoResult<Option<AccountWithPassword>> {
        self.inner.find_credentials_by_id(id).await
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepoResult<Option<AccountWithPassword>> {
        self.inner.find_credentials_by_email(email).await
    }

    async fn create(&self, new: NewAccount) -> RepoResult<Account> {
        self.inner.create(new).await
    }

    async fn list(&self, filter: &AccountFilter) -> RepoResult<Vec<Account>> {
        self.inner.list(filter).await
    }

    async fn update(&self, id: Uuid, changes: &AccountChanges) -> RepoResult<Option<Account>> {
        let updated = self.inner.update(id, changes).await?;
        self.invalidate(id).await;
        Ok(updated)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let changed = self.inner.set_password_hash(id, password_hash).await?;
        self.invalidate(id).await;
        Ok(changed)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let deleted = self.inner.delete(id).await?;
        self.invalidate(id).await;
        Ok(deleted)
    }
}
