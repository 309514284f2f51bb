/// Factory: build `TokenService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::TokenService;

pub fn build_token_service(config: &Config) -> Arc<TokenService> {
    let tokens = TokenService::new(&config.jwt);
    tracing::debug!(?tokens, "token service ready");
    Arc::new(tokens)
}
