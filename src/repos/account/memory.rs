//! In-process AccountStore for router/middleware tests.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    Account, AccountChanges, AccountFilter, AccountStore, AccountWithPassword, NewAccount,
    normalize_email,
};
use crate::repos::error::{RepoError, RepoResult};

#[derive(Default)]
pub struct MemoryAccountStore {
    rows: Mutex<HashMap<Uuid, AccountWithPassword>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn email_taken(
        rows: &HashMap<Uuid, AccountWithPassword>,
        email: &str,
        except: Option<Uuid>,
    ) -> bool {
        rows.values()
            .any(|r| r.account.email == email && Some(r.account.id) != except)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Account>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&id).map(|r| r.account.clone()))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        Ok(self
            .find_credentials_by_email(email)
            .await?
            .map(|r| r.account))
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> RepoResult<Option<AccountWithPassword>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&id).cloned())
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepoResult<Option<AccountWithPassword>> {
        let email = normalize_email(email);
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().find(|r| r.account.email == email).cloned())
    }

    async fn create(&self, new: NewAccount) -> RepoResult<Account> {
        let email = normalize_email(&new.email);
        let mut rows = self.rows.lock().unwrap();
        if Self::email_taken(&rows, &email, None) {
            return Err(RepoError::Conflict);
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            email,
            role: new.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        rows.insert(
            account.id,
            AccountWithPassword {
                account: account.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(account)
    }

    async fn list(&self, filter: &AccountFilter) -> RepoResult<Vec<Account>> {
        let rows = self.rows.lock().unwrap();
        let mut out: Vec<Account> = rows
            .values()
            .map(|r| r.account.clone())
            .filter(|a| filter.matches(a))
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn update(&self, id: Uuid, changes: &AccountChanges) -> RepoResult<Option<Account>> {
        let mut rows = self.rows.lock().unwrap();
        let email = changes.email.as_deref().map(normalize_email);
        if let Some(email) = &email
            && Self::email_taken(&rows, email, Some(id))
        {
            return Err(RepoError::Conflict);
        }

        let Some(row) = rows.get_mut(&id) else {
            return Ok(None);
        };
        let account = &mut row.account;
        if let Some(name) = &changes.name {
            account.name = name.trim().to_string();
        }
        if let Some(email) = email {
            account.email = email;
        }
        if let Some(role) = changes.role {
            account.role = role;
        }
        if let Some(active) = changes.is_active {
            account.is_active = active;
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(row) => {
                row.password_hash = password_hash.to_string();
                row.account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.remove(&id).is_some())
    }
}
