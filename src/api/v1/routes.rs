/*
 * Responsibility
 * - v1 URL structure: /health, /auth, /users
 * - Which stages guard which route (validate, protect, authorize)
 *
 * axum applies layers inside-out: the validator goes on first, then authorize,
 * then protect, so a request meets protect -> authorize -> validate -> handler.
 */
use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::api::v1::handlers::{
    auth::{login, me, register, update_password},
    health::health,
    users::{
        delete_user, get_user, list_users, toggle_user_status, update_user, update_user_role,
    },
};
use crate::middleware::auth::{authorize, protect};
use crate::middleware::validate::{self, LengthBounds, PasswordPolicy, Validator};
use crate::repos::account::{Role, RoleSet};
use crate::state::AppState;

const ADMIN: RoleSet = RoleSet::of(&[Role::Admin]);

const ROLES: &[&str] = &["user", "admin"];

const NAME_LENGTH: LengthBounds = LengthBounds {
    min: Some(2),
    max: Some(50),
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth_routes(state.clone()))
        .merge(user_routes(state))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    let register_route = validate::apply(
        Router::new().route("/auth/register", post(register)),
        Validator::new()
            .max_fields(20)
            .trim(&["name", "email"])
            .required(&["name", "email", "password"])
            .length(&[("name", NAME_LENGTH)])
            .email("email")
            .password(PasswordPolicy::default())
            .one_of("role", ROLES),
    );

    let login_route = validate::apply(
        Router::new().route("/auth/login", post(login)),
        Validator::new()
            .trim(&["email"])
            .required(&["email", "password"])
            .email("email"),
    );

    let me_route = protect::apply(Router::new().route("/auth/me", get(me)), state.clone());

    let password_route = validate::apply(
        Router::new().route("/auth/updatepassword", put(update_password)),
        Validator::new()
            .required(&["currentPassword", "newPassword"])
            .password(PasswordPolicy::default()),
    );
    let password_route = protect::apply(password_route, state);

    register_route
        .merge(login_route)
        .merge(me_route)
        .merge(password_route)
}

fn user_routes(state: AppState) -> Router<AppState> {
    let by_id = Validator::new().path_id("id");

    let list = Router::new().route("/users", get(list_users));

    let read_delete = validate::apply(
        Router::new().route("/users/{id}", get(get_user).delete(delete_user)),
        by_id.clone(),
    );

    let update = validate::apply(
        Router::new().route("/users/{id}", put(update_user)),
        by_id
            .clone()
            .max_fields(20)
            .trim(&["name", "email"])
            .length(&[("name", NAME_LENGTH)])
            .email("email")
            .one_of("role", ROLES),
    );

    let role = validate::apply(
        Router::new().route("/users/{id}/role", patch(update_user_role)),
        by_id.clone().required(&["role"]).one_of("role", ROLES),
    );

    let toggle = validate::apply(
        Router::new().route("/users/{id}/toggle", patch(toggle_user_status)),
        by_id,
    );

    let users = list.merge(read_delete).merge(update).merge(role).merge(toggle);
    let users = authorize::apply(users, ADMIN);
    protect::apply(users, state)
}
