/**
 * Responsibility
 * - The meaning a repository passes upward (db failure, duplicate key, bad row)
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("conflict")]
    Conflict,
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    // 23505 = unique_violation (accounts_email_key)
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return RepoError::Conflict;
        }
        RepoError::Db(e)
    }
}
