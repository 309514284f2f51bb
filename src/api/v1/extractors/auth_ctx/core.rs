use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::middleware::auth::AuthError;
use crate::state::AppState;

use super::AuthCtx;

/// Extractor for the AuthCtx the gate inserted into request extensions.
///
/// A route without `protect` in front of it has no AuthCtx and is answered with 401.
pub struct AuthCtxExtractor(pub AuthCtx);

impl FromRequestParts<AppState> for AuthCtxExtractor
where
    AppState: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or(AuthError::Rejected)
    }
}
