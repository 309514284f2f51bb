//! Pure request-body checks.
//!
//! Every check takes the parsed body object (and path params where relevant) and
//! returns `Err(message)` with the exact client-facing text on failure.
//! "Falsy" follows the loose JSON notion the clients were written against:
//! absent, `null`, `false`, `0` and `""` all count as not provided.
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

pub type Body = Map<String, Value>;
pub type PathParams = HashMap<String, String>;

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

pub fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

pub fn required(body: &Body, fields: &[&str]) -> Result<(), String> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|f| is_falsy(body.get(*f)))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("Missing required fields: {}", missing.join(", ")))
    }
}

pub fn email(body: &Body, field: &str) -> Result<(), String> {
    let value = body.get(field);
    if is_falsy(value) {
        return Ok(());
    }

    match value {
        Some(Value::String(s)) if is_valid_email(s) => Ok(()),
        _ => Err("Please provide a valid email address".to_string()),
    }
}

// Word runs joined by single '.' or '-' on both sides, ending in 2-3 char labels.
// ASCII `\w` only, like the browser-side check.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?-u:\w)+([.-]?(?-u:\w)+)*@(?-u:\w)+([.-]?(?-u:\w)+)*(\.(?-u:\w){2,3})+$")
        .expect("invalid email pattern")
});

pub fn is_valid_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

pub fn path_id(params: &PathParams, param: &str) -> Result<(), String> {
    match params.get(param).map(|raw| Uuid::parse_str(raw)) {
        Some(Ok(_)) => Ok(()),
        _ => Err("Invalid ID format".to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            require_uppercase: false,
            require_lowercase: false,
            require_numbers: false,
            require_special_chars: false,
        }
    }
}

/// Checks `password`, or `newPassword` when `password` is not provided.
pub fn password(body: &Body, policy: &PasswordPolicy) -> Result<(), String> {
    let value = if is_falsy(body.get("password")) {
        body.get("newPassword")
    } else {
        body.get("password")
    };
    if is_falsy(value) {
        return Ok(());
    }
    let Some(Value::String(pw)) = value else {
        return Err("Password must be a string".to_string());
    };

    let mut errors = Vec::new();
    if pw.chars().count() < policy.min_length {
        errors.push(format!(
            "Password must be at least {} characters",
            policy.min_length
        ));
    }
    if policy.require_uppercase && !pw.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if policy.require_lowercase && !pw.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if policy.require_numbers && !pw.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }
    if policy.require_special_chars && !pw.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        errors.push("Password must contain at least one special character".to_string());
    }

    join_errors(errors)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub integer: bool,
}

pub fn numeric(body: &Body, fields: &[(&str, NumericBounds)]) -> Result<(), String> {
    let mut errors = Vec::new();

    for (field, bounds) in fields {
        let value = match body.get(*field) {
            None | Some(Value::Null) => continue,
            Some(v) => v,
        };
        let Some(n) = to_number(value) else {
            errors.push(format!("{field} must be a number"));
            continue;
        };

        if let Some(min) = bounds.min
            && n < min
        {
            errors.push(format!("{field} must be at least {min}"));
        }
        if let Some(max) = bounds.max
            && n > max
        {
            errors.push(format!("{field} must be at most {max}"));
        }
        if bounds.integer && (!n.is_finite() || n.fract() != 0.0) {
            errors.push(format!("{field} must be a whole number"));
        }
    }

    join_errors(errors)
}

// Loose numeric coercion: numeric strings, booleans as 1/0, blank string as 0.
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(0.0);
            }
            match s {
                "Infinity" | "+Infinity" => return Some(f64::INFINITY),
                "-Infinity" => return Some(f64::NEG_INFINITY),
                _ => {}
            }
            // Rust accepts "inf"/"nan" spellings that are not numbers here
            if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
                return None;
            }
            s.parse::<f64>().ok().filter(|n| !n.is_nan())
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

pub fn length(body: &Body, fields: &[(&str, LengthBounds)]) -> Result<(), String> {
    let mut errors = Vec::new();

    for (field, bounds) in fields {
        let value = body.get(*field);
        if is_falsy(value) {
            continue;
        }
        let Some(Value::String(s)) = value else {
            errors.push(format!("{field} must be a string"));
            continue;
        };

        let len = s.trim().chars().count();
        if let Some(min) = bounds.min
            && len < min
        {
            errors.push(format!("{field} must be at least {min} characters"));
        }
        if let Some(max) = bounds.max
            && len > max
        {
            errors.push(format!("{field} must be at most {max} characters"));
        }
    }

    join_errors(errors)
}

pub fn one_of(body: &Body, field: &str, allowed: &[&str]) -> Result<(), String> {
    let value = body.get(field);
    if is_falsy(value) {
        return Ok(());
    }

    match value {
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => Ok(()),
        _ => Err(format!("{field} must be one of: {}", allowed.join(", "))),
    }
}

/// Trim string fields in place. Never fails.
pub fn trim(body: &mut Body, fields: &[&str]) {
    for field in fields {
        if let Some(Value::String(s)) = body.get_mut(*field) {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
    }
}

pub fn max_fields(body: &Body, max: usize) -> Result<(), String> {
    if body.len() > max {
        Err(format!(
            "Too many fields in request body. Maximum {max} allowed."
        ))
    } else {
        Ok(())
    }
}

fn join_errors(errors: Vec<String>) -> Result<(), String> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> Body {
        match v {
            Value::Object(m) => m,
            _ => panic!("test body must be an object"),
        }
    }

    #[test]
    fn falsy_values_count_as_missing() {
        let b = body(json!({"a": "", "b": null, "c": false, "d": 0, "e": "x", "f": [], "g": 0.0}));
        assert_eq!(
            required(&b, &["a", "b", "c", "d", "e", "f", "g", "h"]),
            Err("Missing required fields: a, b, c, d, g, h".to_string())
        );
        assert_eq!(required(&b, &["e", "f"]), Ok(()));
    }

    #[test]
    fn email_accepts_common_shapes() {
        for ok in [
            "a@b.com",
            "first.last@example.co",
            "x_y-z@mail.example.org",
            "a@b.co.uk",
            "A1@B2.IO",
        ] {
            assert!(is_valid_email(ok), "{ok}");
        }
    }

    #[test]
    fn email_rejects_malformed() {
        for bad in [
            "plainaddress",
            "@b.com",
            "a@",
            "a@b",
            "a@b.c",
            "a@b.info",
            "a..b@c.com",
            "a.@b.com",
            ".a@b.com",
            "a@b..com",
            "a@-b.com",
            "a b@c.com",
            "a@b@c.com",
            "a+tag@b.com",
            "a@b.c-m",
            "ü@b.com",
            "a@b.cöm",
        ] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn email_check_skips_falsy_and_rejects_non_strings() {
        assert_eq!(email(&body(json!({})), "email"), Ok(()));
        assert_eq!(email(&body(json!({"email": ""})), "email"), Ok(()));
        assert_eq!(
            email(&body(json!({"email": 42})), "email"),
            Err("Please provide a valid email address".to_string())
        );
    }

    #[test]
    fn path_id_requires_uuid() {
        let mut params = PathParams::new();
        assert!(path_id(&params, "id").is_err());

        params.insert("id".into(), "123".into());
        assert_eq!(path_id(&params, "id"), Err("Invalid ID format".to_string()));

        params.insert("id".into(), Uuid::new_v4().to_string());
        assert_eq!(path_id(&params, "id"), Ok(()));
    }

    #[test]
    fn password_default_policy_is_length_only() {
        let p = PasswordPolicy::default();
        assert_eq!(password(&body(json!({"password": "abcdef"})), &p), Ok(()));
        assert_eq!(
            password(&body(json!({"password": "abc"})), &p),
            Err("Password must be at least 6 characters".to_string())
        );
        assert_eq!(password(&body(json!({})), &p), Ok(()));
    }

    #[test]
    fn password_falls_back_to_new_password_and_joins_failures() {
        let p = PasswordPolicy {
            min_length: 8,
            require_uppercase: true,
            require_numbers: true,
            ..PasswordPolicy::default()
        };
        assert_eq!(
            password(&body(json!({"currentPassword": "whatever", "newPassword": "short"})), &p),
            Err(
                "Password must be at least 8 characters, \
                 Password must contain at least one uppercase letter, \
                 Password must contain at least one number"
                    .to_string()
            )
        );
        assert_eq!(password(&body(json!({"newPassword": "Longer123"})), &p), Ok(()));
    }

    #[test]
    fn password_special_chars() {
        let p = PasswordPolicy {
            require_special_chars: true,
            require_lowercase: true,
            ..PasswordPolicy::default()
        };
        assert_eq!(
            password(&body(json!({"password": "ABCDEFG"})), &p),
            Err(
                "Password must contain at least one lowercase letter, \
                 Password must contain at least one special character"
                    .to_string()
            )
        );
        assert_eq!(password(&body(json!({"password": "abc{def"})), &p), Ok(()));
    }

    #[test]
    fn numeric_coerces_and_bounds() {
        let fields = [
            (
                "price",
                NumericBounds {
                    min: Some(0.0),
                    ..Default::default()
                },
            ),
            (
                "quantity",
                NumericBounds {
                    min: Some(0.0),
                    max: Some(100.0),
                    integer: true,
                },
            ),
        ];

        assert_eq!(numeric(&body(json!({"price": "9.5", "quantity": 3})), &fields), Ok(()));
        assert_eq!(numeric(&body(json!({"price": null})), &fields), Ok(()));
        assert_eq!(numeric(&body(json!({"price": "", "quantity": true})), &fields), Ok(()));
        assert_eq!(
            numeric(&body(json!({"price": "abc"})), &fields),
            Err("price must be a number".to_string())
        );
        assert_eq!(
            numeric(&body(json!({"price": "nan"})), &fields),
            Err("price must be a number".to_string())
        );
        assert_eq!(
            numeric(&body(json!({"price": -1, "quantity": 100.5})), &fields),
            Err(
                "price must be at least 0, quantity must be at most 100, \
                 quantity must be a whole number"
                    .to_string()
            )
        );
        assert_eq!(
            numeric(&body(json!({"quantity": [1]})), &fields),
            Err("quantity must be a number".to_string())
        );
    }

    #[test]
    fn length_uses_trimmed_char_count() {
        let fields = [(
            "name",
            LengthBounds {
                min: Some(2),
                max: Some(5),
            },
        )];
        assert_eq!(length(&body(json!({"name": "  ab  "})), &fields), Ok(()));
        assert_eq!(length(&body(json!({"name": "ñé"})), &fields), Ok(()));
        assert_eq!(length(&body(json!({"name": ""})), &fields), Ok(()));
        assert_eq!(
            length(&body(json!({"name": " a "})), &fields),
            Err("name must be at least 2 characters".to_string())
        );
        assert_eq!(
            length(&body(json!({"name": "abcdef"})), &fields),
            Err("name must be at most 5 characters".to_string())
        );
        assert_eq!(
            length(&body(json!({"name": 12})), &fields),
            Err("name must be a string".to_string())
        );
    }

    #[test]
    fn one_of_lists_allowed_values() {
        let allowed = ["user", "admin"];
        assert_eq!(one_of(&body(json!({"role": "admin"})), "role", &allowed), Ok(()));
        assert_eq!(one_of(&body(json!({})), "role", &allowed), Ok(()));
        assert_eq!(
            one_of(&body(json!({"role": "root"})), "role", &allowed),
            Err("role must be one of: user, admin".to_string())
        );
        assert!(one_of(&body(json!({"role": 1})), "role", &allowed).is_err());
    }

    #[test]
    fn trim_only_touches_listed_strings() {
        let mut b = body(json!({"name": "  Ada ", "email": " a@b.com ", "n": 5}));
        trim(&mut b, &["name", "n", "missing"]);
        assert_eq!(b["name"], "Ada");
        assert_eq!(b["email"], " a@b.com ");
        assert_eq!(b["n"], 5);
    }

    #[test]
    fn max_fields_counts_top_level_keys() {
        let b = body(json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(max_fields(&b, 3), Ok(()));
        assert_eq!(
            max_fields(&b, 2),
            Err("Too many fields in request body. Maximum 2 allowed.".to_string())
        );
    }
}
