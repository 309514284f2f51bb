/*
 * Responsibility
 * - SQLx operations against the `accounts` table
 * - Receives a PgPool and provides AccountStore
 * - unique_violation on email surfaces as RepoError::Conflict
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    Account, AccountChanges, AccountFilter, AccountStore, AccountWithPassword, NewAccount, Role,
    normalize_email,
};
use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepoError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| RepoError::Corrupt(e.to_string()))?;

        Ok(Account {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<CredentialRow> for AccountWithPassword {
    type Error = RepoError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(AccountWithPassword {
            account: row.account.try_into()?,
            password_hash: row.password_hash,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, role, is_active, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, role, is_active, created_at, updated_at
            FROM accounts
            WHERE lower(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        row.map(Account::try_from).transpose()
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> RepoResult<Option<AccountWithPassword>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, name, email, role, is_active, created_at, updated_at, password_hash
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        row.map(AccountWithPassword::try_from).transpose()
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepoResult<Option<AccountWithPassword>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, name, email, role, is_active, created_at, updated_at, password_hash
            FROM accounts
            WHERE lower(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        row.map(AccountWithPassword::try_from).transpose()
    }

    async fn create(&self, new: NewAccount) -> RepoResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, role, is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.name.trim())
        .bind(normalize_email(&new.email))
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        row.try_into()
    }

    async fn list(&self, filter: &AccountFilter) -> RepoResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, role, is_active, created_at, updated_at
            FROM accounts
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.role.map(|r| r.as_str()))
        .bind(filter.is_active)
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn update(&self, id: Uuid, changes: &AccountChanges) -> RepoResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, role, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.email.as_deref().map(normalize_email))
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        row.map(Account::try_from).transpose()
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}
