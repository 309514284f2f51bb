//! Role check over the AuthCtx that `protect` attached.
use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::middleware::auth::AuthError;
use crate::repos::account::RoleSet;
use crate::state::AppState;

/// Restrict every route of `router` to `allowed`.
///
/// Must sit inside `protect` (apply this one first).
pub fn apply(router: Router<AppState>, allowed: RoleSet) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(allowed, authorize_middleware))
}

pub fn check(ctx: Option<&AuthCtx>, allowed: RoleSet) -> Result<(), AuthError> {
    let ctx = ctx.ok_or(AuthError::Rejected)?;
    if allowed.contains(ctx.account.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole {
            role: ctx.account.role,
            allowed,
        })
    }
}

async fn authorize_middleware(
    State(allowed): State<RoleSet>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(err) = check(req.extensions().get::<AuthCtx>(), allowed) {
        tracing::warn!(
            path = %req.uri().path(),
            error = %err,
            "authorization denied"
        );
        return Err(err);
    }

    Ok(next.run(req).await)
}
