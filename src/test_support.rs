//! Shared fixtures for router and middleware tests.
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
};
use serde_json::Value;

use crate::config::JwtConfig;
use crate::repos::account::memory::MemoryAccountStore;
use crate::repos::account::{Account, AccountStore, NewAccount, Role};
use crate::services::auth::{TokenService, password};
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-access-secret";

fn jwt_config(secret: &str) -> JwtConfig {
    JwtConfig {
        secret: secret.to_string(),
        expires_in_seconds: 3600,
        refresh_secret: format!("{secret}-refresh"),
        refresh_expires_in_seconds: 7200,
        leeway_seconds: 0,
    }
}

pub fn test_token_service(secret: &str) -> TokenService {
    TokenService::new(&jwt_config(secret))
}

pub fn test_state() -> (AppState, Arc<MemoryAccountStore>) {
    let store = Arc::new(MemoryAccountStore::new());
    let state = AppState::new(store.clone(), Arc::new(test_token_service(TEST_SECRET)));
    (state, store)
}

pub async fn seed_account(
    store: &MemoryAccountStore,
    email: &str,
    plain_password: &str,
    role: Role,
) -> Account {
    store
        .create(NewAccount {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: password::hash_password(plain_password).unwrap(),
            role,
        })
        .await
        .unwrap()
}

pub async fn body_json(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn builder(method: &str, uri: &str, bearer: Option<&str>) -> axum::http::request::Builder {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    req
}

pub fn json_request(method: &str, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    builder(method, uri, bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, bearer: Option<&str>) -> Request<Body> {
    builder(method, uri, bearer).body(Body::empty()).unwrap()
}
