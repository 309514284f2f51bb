/*
 * Responsibility
 * - The authenticated context handlers see
 * - protect stores it in request extensions; handlers only ever receive this type
 *
 * Notes
 * - Token checks and the account lookup belong to middleware/services
 * - Account carries no password material, so neither does the context
 */
use uuid::Uuid;

use crate::repos::account::{Account, Role};

/// Context attached to a request that passed the gate.
///
/// Lives for one request only.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub account: Account,
}

impl AuthCtx {
    pub fn new(account: Account) -> Self {
        Self { account }
    }

    pub fn account_id(&self) -> Uuid {
        self.account.id
    }

    pub fn role(&self) -> Role {
        self.account.role
    }
}
