/*!
 * Account storage
 *
 * Responsibility:
 * - The AccountStore seam the gate and the handlers depend on
 * - Postgres implementation, plus a read-through cache decorator
 *
 * Public API:
 * - Account, Role, RoleSet and friends (model)
 * - AccountStore
 * - PgAccountStore, CachedAccountStore
 */
use async_trait::async_trait;
use uuid::Uuid;

use crate::repos::error::RepoResult;

mod cached;
#[cfg(test)]
pub(crate) mod memory;
mod model;
mod postgres;

pub use cached::CachedAccountStore;
pub use model::*;
pub use postgres::PgAccountStore;

/// Storage operations the auth layer and the account routes need.
///
/// Implementations must be safe to share across requests (`Arc<dyn AccountStore>`).
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>>;

    async fn find_credentials_by_id(&self, id: Uuid) -> RepoResult<Option<AccountWithPassword>>;

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepoResult<Option<AccountWithPassword>>;

    // Duplicate email -> RepoError::Conflict
    async fn create(&self, new: NewAccount) -> RepoResult<Account>;

    // Newest first
    async fn list(&self, filter: &AccountFilter) -> RepoResult<Vec<Account>>;

    async fn update(&self, id: Uuid, changes: &AccountChanges) -> RepoResult<Option<Account>>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> RepoResult<bool>;

    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}
