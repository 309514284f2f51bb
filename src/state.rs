/*
 * Responsibility
 * - Shared context handed to the router (AppState)
 *   - accounts: the AccountStore (Postgres, optionally behind the Valkey cache)
 *   - tokens: TokenService built from Config at startup
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::repos::account::AccountStore;
use crate::services::auth::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(accounts: Arc<dyn AccountStore>, tokens: Arc<TokenService>) -> Self {
        Self { accounts, tokens }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
