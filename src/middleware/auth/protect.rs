//! Access token verification -> account lookup -> AuthCtx in request extensions.
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, error, warn};

use crate::api::v1::extractors::AuthCtx;
use crate::middleware::auth::AuthError;
use crate::services::auth::TokenService;
use crate::state::AppState;

/// Require an authenticated, active account on every route of `router`.
///
/// ```ignore
/// let me = Router::new().route("/me", get(me));
/// let me = middleware::auth::protect::apply(me, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot take the State extractor in axum 0.8, pass it explicitly
    router.route_layer(middleware::from_fn_with_state(state, protect_middleware))
}

/// Token from `Authorization: Bearer <token>`.
///
/// Same leniency the web client relies on: the header only has to start with
/// `Bearer`, and the token is the second space-separated segment.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    if !value.starts_with("Bearer") {
        return None;
    }
    value.split(' ').nth(1).filter(|t| !t.is_empty())
}

async fn protect_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())
        .ok_or(AuthError::MissingCredential)?
        .to_string();

    let verified = state.tokens.verify_access_token(&token).map_err(|err| {
        let claimed_id = TokenService::decode_unsafe(&token).and_then(|p| p.get("id").cloned());
        debug!(error = %err, ?claimed_id, "access token rejected");
        AuthError::from(err)
    })?;

    let account = match state.accounts.find_by_id(verified.id).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            debug!(account_id = %verified.id, "token for unknown account");
            return Err(AuthError::UnknownAccount);
        }
        Err(err) => {
            error!(account_id = %verified.id, error = %err, "account lookup failed");
            return Err(AuthError::Rejected);
        }
    };

    if !account.is_active {
        warn!(account_id = %account.id, "deactivated account presented a valid token");
        return Err(AuthError::DeactivatedAccount);
    }

    // middleware -> extractor hand-off
    req.extensions_mut().insert(AuthCtx::new(account));

    Ok(next.run(req).await)
}
