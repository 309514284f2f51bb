/*!
 * Request validation stage
 *
 * Responsibility:
 * - Run an ordered list of body / path checks in front of a handler
 * - First failing check wins and answers 400 `{success: false, message}`
 * - Checks may rewrite the body (trim); the rewritten JSON is what the handler reads
 *
 * Public API:
 * - Validator (builder), Check
 * - apply(router, validator)
 * - rules::{PasswordPolicy, NumericBounds, LengthBounds}
 */
use std::fmt;
use std::sync::Arc;

use axum::{
    Router,
    body::Body as HttpBody,
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;

use crate::error::AppError;
use crate::state::AppState;

pub mod rules;

pub use rules::{Body, LengthBounds, NumericBounds, PasswordPolicy, PathParams};

const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body could not be read")]
    Unreadable,
    #[error("Request body is not valid JSON")]
    MalformedJson,
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("{0}")]
    Rejected(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::bad_request(e.to_string())
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

pub type CustomFn = dyn Fn(&Body, &PathParams) -> Result<(), String> + Send + Sync;

/// One step of a validator.
#[derive(Clone)]
pub enum Check {
    Required(Vec<&'static str>),
    Email(&'static str),
    PathId(&'static str),
    Password(PasswordPolicy),
    Numeric(Vec<(&'static str, NumericBounds)>),
    Length(Vec<(&'static str, LengthBounds)>),
    OneOf(&'static str, Vec<&'static str>),
    Trim(Vec<&'static str>),
    MaxFields(usize),
    Custom(&'static str, Arc<CustomFn>),
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Required(fields) => f.debug_tuple("Required").field(fields).finish(),
            Check::Email(field) => f.debug_tuple("Email").field(field).finish(),
            Check::PathId(param) => f.debug_tuple("PathId").field(param).finish(),
            Check::Password(policy) => f.debug_tuple("Password").field(policy).finish(),
            Check::Numeric(fields) => f.debug_tuple("Numeric").field(fields).finish(),
            Check::Length(fields) => f.debug_tuple("Length").field(fields).finish(),
            Check::OneOf(field, allowed) => {
                f.debug_tuple("OneOf").field(field).field(allowed).finish()
            }
            Check::Trim(fields) => f.debug_tuple("Trim").field(fields).finish(),
            Check::MaxFields(n) => f.debug_tuple("MaxFields").field(n).finish(),
            Check::Custom(name, _) => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

impl Check {
    fn run(&self, body: &mut Body, params: &PathParams) -> Result<(), String> {
        match self {
            Check::Required(fields) => rules::required(body, fields),
            Check::Email(field) => rules::email(body, field),
            Check::PathId(param) => rules::path_id(params, param),
            Check::Password(policy) => rules::password(body, policy),
            Check::Numeric(fields) => rules::numeric(body, fields),
            Check::Length(fields) => rules::length(body, fields),
            Check::OneOf(field, allowed) => rules::one_of(body, field, allowed),
            Check::Trim(fields) => {
                rules::trim(body, fields);
                Ok(())
            }
            Check::MaxFields(n) => rules::max_fields(body, *n),
            Check::Custom(_, check) => check(body, params).map_err(|msg| {
                if msg.is_empty() {
                    "Validation failed".to_string()
                } else {
                    msg
                }
            }),
        }
    }
}

/// Ordered checks attached to one route.
///
/// ```ignore
/// let v = Validator::new()
///     .trim(&["name", "email"])
///     .required(&["name", "email", "password"])
///     .email("email")
///     .password(PasswordPolicy::default());
/// ```
#[derive(Clone, Debug)]
pub struct Validator {
    checks: Vec<Check>,
    body_limit: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            checks: Vec::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn required(self, fields: &[&'static str]) -> Self {
        self.check(Check::Required(fields.to_vec()))
    }

    pub fn email(self, field: &'static str) -> Self {
        self.check(Check::Email(field))
    }

    pub fn path_id(self, param: &'static str) -> Self {
        self.check(Check::PathId(param))
    }

    pub fn password(self, policy: PasswordPolicy) -> Self {
        self.check(Check::Password(policy))
    }

    pub fn numeric(self, fields: &[(&'static str, NumericBounds)]) -> Self {
        self.check(Check::Numeric(fields.to_vec()))
    }

    pub fn length(self, fields: &[(&'static str, LengthBounds)]) -> Self {
        self.check(Check::Length(fields.to_vec()))
    }

    pub fn one_of(self, field: &'static str, allowed: &[&'static str]) -> Self {
        self.check(Check::OneOf(field, allowed.to_vec()))
    }

    pub fn trim(self, fields: &[&'static str]) -> Self {
        self.check(Check::Trim(fields.to_vec()))
    }

    pub fn max_fields(self, max: usize) -> Self {
        self.check(Check::MaxFields(max))
    }

    pub fn custom<F>(self, name: &'static str, check: F) -> Self
    where
        F: Fn(&Body, &PathParams) -> Result<(), String> + Send + Sync + 'static,
    {
        self.check(Check::Custom(name, Arc::new(check)))
    }

    /// Run every check in order against an already parsed body.
    pub fn run(&self, body: &mut Body, params: &PathParams) -> Result<(), ValidationError> {
        for check in &self.checks {
            if let Err(message) = check.run(body, params) {
                tracing::debug!(?check, %message, "request rejected by validator");
                return Err(ValidationError::Rejected(message));
            }
        }
        Ok(())
    }
}

/// Parse a buffered request body as the JSON object the checks operate on.
pub fn parse_body(bytes: &[u8]) -> Result<Body, ValidationError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Body::new());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::NotAnObject),
        Err(_) => Err(ValidationError::MalformedJson),
    }
}

/// Attach a validator to every route of `router`. On gated routes apply it before
/// the auth stages so it runs after them.
pub fn apply(router: Router<AppState>, validator: Validator) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        Arc::new(validator),
        validate_middleware,
    ))
}

async fn validate_middleware(
    State(validator): State<Arc<Validator>>,
    req: Request,
    next: Next,
) -> Result<Response, ValidationError> {
    let (mut parts, body) = req.into_parts();

    let params: PathParams = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(raw) => raw
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        Err(_) => PathParams::new(),
    };

    let bytes = axum::body::to_bytes(body, validator.body_limit)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "failed to buffer request body");
            ValidationError::Unreadable
        })?;

    let mut map = parse_body(&bytes)?;
    validator.run(&mut map, &params)?;

    let rewritten = serde_json::to_vec(&Value::Object(map)).map_err(|e| {
        tracing::error!(error = %e, "failed to re-encode validated body");
        ValidationError::Unreadable
    })?;

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    let req = Request::from_parts(parts, HttpBody::from(rewritten));
    Ok(next.run(req).await)
}
