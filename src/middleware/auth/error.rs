use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::AppError;
use crate::repos::account::{Role, RoleSet};
use crate::services::auth::TokenError;

/// Why the gate turned a request away. The Display text is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Not authorized to access this route. Please login.")]
    MissingCredential,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired. Please login again.")]
    ExpiredToken,
    #[error("Not authorized to access this route")]
    Rejected,
    #[error("User no longer exists")]
    UnknownAccount,
    #[error("Your account has been deactivated")]
    DeactivatedAccount,
    #[error("User role '{role}' is not authorized to access this route (allowed: {allowed})")]
    InsufficientRole { role: Role, allowed: RoleSet },
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::NotYetValid | TokenError::Signing(_) => AuthError::Rejected,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_only_for_role_mismatch() {
        let err = AuthError::InsufficientRole {
            role: Role::User,
            allowed: RoleSet::of(&[Role::Admin]),
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_string(),
            "User role 'user' is not authorized to access this route (allowed: admin)"
        );

        for e in [
            AuthError::MissingCredential,
            AuthError::InvalidToken,
            AuthError::ExpiredToken,
            AuthError::Rejected,
            AuthError::UnknownAccount,
            AuthError::DeactivatedAccount,
        ] {
            assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn token_errors_map_to_messages() {
        assert_eq!(AuthError::from(TokenError::Invalid).to_string(), "Invalid token");
        assert_eq!(
            AuthError::from(TokenError::Expired).to_string(),
            "Token expired. Please login again."
        );
        assert_eq!(
            AuthError::from(TokenError::NotYetValid).to_string(),
            "Not authorized to access this route"
        );
    }
}
