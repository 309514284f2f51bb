/*
 * Responsibility
 * - /auth handlers: register, login, me, updatepassword
 * - Issue tokens through TokenService, hash / compare passwords through services::auth::password
 */
use axum::{Json, extract::State, http::StatusCode};
use tracing::{error, info, warn};

use crate::{
    api::v1::{
        dto::{
            auth::{
                AccountSummary, LoginRequest, MeResponse, RegisterRequest, SessionResponse,
                TokenResponse, UpdatePasswordRequest,
            },
            envelope::ApiResponse,
        },
        extractors::{ApiJson, AuthCtxExtractor},
    },
    error::AppError,
    repos::{
        account::{Account, AccountWithPassword, NewAccount, Role},
        error::RepoError,
    },
    services::auth::{TokenError, password},
    state::AppState,
};

fn token_failure(e: TokenError) -> AppError {
    error!(error = %e, "failed to issue token");
    AppError::Internal
}

fn issue_session(state: &AppState, account: &Account) -> Result<SessionResponse, AppError> {
    Ok(SessionResponse {
        user: AccountSummary::from(account),
        token: state
            .tokens
            .issue_access_token(account.id)
            .map_err(token_failure)?,
        refresh_token: state
            .tokens
            .issue_refresh_token(account.id)
            .map_err(token_failure)?,
    })
}

// argon2 is CPU-bound, keep it off the async workers
async fn hash(plain: &str) -> Result<String, AppError> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| {
            error!(error = %e, "password hashing task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            error!(error = %e, "failed to hash password");
            AppError::Internal
        })
}

async fn password_matches(creds: &AccountWithPassword, candidate: &str) -> Result<bool, AppError> {
    let creds = creds.clone();
    let candidate = candidate.to_string();
    tokio::task::spawn_blocking(move || creds.compare_password(&candidate))
        .await
        .map_err(|e| {
            error!(error = %e, "password verification task failed");
            AppError::Internal
        })
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), AppError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request(
            "Please provide name, email, and password",
        ));
    }

    let role = match req.role.as_deref().filter(|r| !r.is_empty()) {
        None => Role::default(),
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|_| AppError::bad_request("Role must be either user or admin"))?,
    };

    if state.accounts.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::bad_request("User with this email already exists"));
    }

    let account = state
        .accounts
        .create(NewAccount {
            name: req.name,
            email: req.email,
            password_hash: hash(&req.password).await?,
            role,
        })
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent registration
            RepoError::Conflict => AppError::bad_request("User with this email already exists"),
            other => other.into(),
        })?;

    info!(account_id = %account.id, role = %account.role, "account registered");

    let session = issue_session(&state, &account)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            session,
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("Please provide email and password"));
    }

    let Some(creds) = state.accounts.find_credentials_by_email(&req.email).await? else {
        return Err(AppError::unauthenticated("Invalid credentials"));
    };

    if !creds.account.is_active {
        warn!(account_id = %creds.account.id, "login attempt on deactivated account");
        return Err(AppError::unauthenticated(
            "Your account has been deactivated. Please contact support.",
        ));
    }

    if !password_matches(&creds, &req.password).await? {
        return Err(AppError::unauthenticated("Invalid credentials"));
    }

    let session = issue_session(&state, &creds.account)?;
    Ok(Json(ApiResponse::with_message("Login successful", session)))
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::data(MeResponse { user: ctx.account }))
}

pub async fn update_password(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ApiJson(req): ApiJson<UpdatePasswordRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::bad_request(
            "Please provide current password and new password",
        ));
    }

    let creds = state
        .accounts
        .find_credentials_by_id(ctx.account_id())
        .await?
        .ok_or(AppError::not_found("User"))?;

    if !password_matches(&creds, &req.current_password).await? {
        return Err(AppError::unauthenticated("Current password is incorrect"));
    }

    let new_hash = hash(&req.new_password).await?;
    if !state
        .accounts
        .set_password_hash(creds.account.id, &new_hash)
        .await?
    {
        return Err(AppError::not_found("User"));
    }

    info!(account_id = %creds.account.id, "password changed");

    let token = state
        .tokens
        .issue_access_token(creds.account.id)
        .map_err(token_failure)?;
    Ok(Json(ApiResponse::with_message(
        "Password updated successfully",
        TokenResponse { token },
    )))
}
