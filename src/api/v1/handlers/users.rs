/*
 * Responsibility
 * - Admin-only /users handlers (list, get, update, delete, role, toggle)
 * - protect + authorize(admin) run before these; the acting admin comes from AuthCtx
 * - An admin cannot delete, demote or deactivate their own account here
 */
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::{
            envelope::ApiResponse,
            users::{
                ListUsersQuery, RoleChanged, StatusChanged, UpdateRoleRequest, UpdateUserRequest,
            },
        },
        extractors::{ApiJson, AuthCtxExtractor},
    },
    error::AppError,
    middleware::validate::rules::is_falsy,
    repos::account::{Account, AccountChanges, AccountFilter, Role},
    state::AppState,
};

async fn load(state: &AppState, id: Uuid) -> Result<Account, AppError> {
    state
        .accounts
        .find_by_id(id)
        .await?
        .ok_or(AppError::not_found("User"))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<Account>>>, AppError> {
    let role = match query.role.as_deref().filter(|r| !r.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            // no account can hold an unknown role
            Err(_) => return Ok(Json(ApiResponse::list(Vec::new()))),
        },
    };
    let filter = AccountFilter {
        role,
        is_active: query.is_active.as_deref().map(|v| v == "true"),
    };

    let accounts = state.accounts.list(&filter).await?;
    Ok(Json(ApiResponse::list(accounts)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Account>>, AppError> {
    let account = load(&state, id).await?;
    Ok(Json(ApiResponse::data(account)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<Account>>, AppError> {
    load(&state, id).await?;

    if !is_falsy(req.password.as_ref()) {
        return Err(AppError::bad_request(
            "Use the password update endpoint to change passwords",
        ));
    }

    if matches!(&req.name, Some(n) if n.trim().is_empty()) {
        return Err(AppError::bad_request("Please provide a name"));
    }
    if matches!(&req.email, Some(e) if e.trim().is_empty()) {
        return Err(AppError::bad_request("Please provide an email"));
    }
    let role = match req.role.as_deref() {
        None => None,
        Some(raw) => Some(
            raw.parse::<Role>()
                .map_err(|_| AppError::bad_request("Role must be either user or admin"))?,
        ),
    };

    let changes = AccountChanges {
        name: req.name,
        email: req.email,
        role,
        is_active: req.is_active,
    };
    let account = state
        .accounts
        .update(id, &changes)
        .await?
        .ok_or(AppError::not_found("User"))?;

    info!(account_id = %id, "account updated");
    Ok(Json(ApiResponse::with_message(
        "User updated successfully",
        account,
    )))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    load(&state, id).await?;

    if id == ctx.account_id() {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    if !state.accounts.delete(id).await? {
        return Err(AppError::not_found("User"));
    }

    info!(account_id = %id, by = %ctx.account_id(), "account deleted");
    Ok(Json(ApiResponse::with_message(
        "User deleted successfully",
        json!({}),
    )))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<RoleChanged>>, AppError> {
    let Some(raw) = req.role.as_deref().filter(|r| !r.is_empty()) else {
        return Err(AppError::bad_request("Please provide a role"));
    };
    let role: Role = raw
        .parse()
        .map_err(|_| AppError::bad_request("Role must be either 'user' or 'admin'"))?;

    load(&state, id).await?;

    if id == ctx.account_id() {
        return Err(AppError::bad_request("You cannot change your own role"));
    }

    let changes = AccountChanges {
        role: Some(role),
        ..Default::default()
    };
    let account = state
        .accounts
        .update(id, &changes)
        .await?
        .ok_or(AppError::not_found("User"))?;

    info!(account_id = %id, role = %role, by = %ctx.account_id(), "role changed");
    Ok(Json(ApiResponse::with_message(
        format!("User role updated to {role}"),
        RoleChanged::from(&account),
    )))
}

pub async fn toggle_user_status(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<StatusChanged>>, AppError> {
    let current = load(&state, id).await?;

    if id == ctx.account_id() {
        return Err(AppError::bad_request(
            "You cannot deactivate your own account",
        ));
    }

    let changes = AccountChanges {
        is_active: Some(!current.is_active),
        ..Default::default()
    };
    let account = state
        .accounts
        .update(id, &changes)
        .await?
        .ok_or(AppError::not_found("User"))?;

    let verb = if account.is_active {
        "activated"
    } else {
        "deactivated"
    };
    info!(account_id = %id, by = %ctx.account_id(), "account {verb}");
    Ok(Json(ApiResponse::with_message(
        format!("User {verb} successfully"),
        StatusChanged::from(&account),
    )))
}
