/*
 * Responsibility
 * - Issue HS256 access / refresh tokens that carry an account id
 * - Verify signature + expiry and hand back the id as a Uuid
 * - Keep the two token kinds apart (a refresh token never passes as an access token)
 */
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;

const REFRESH_KIND: &str = "refresh";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            _ => TokenError::Invalid,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: Uuid,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    iat: i64,
    exp: i64,
}

/// What a successful verification yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub id: Uuid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl Keys {
    fn from_secret(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }
}

/// Signs and verifies the bearer credentials.
///
/// Key material is not printable via Debug.
pub struct TokenService {
    access: Keys,
    refresh: Keys,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_seconds", &self.access.ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh.ttl_seconds)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        validation.validate_nbf = true;
        // exp is exclusive: a token is dead at exp, not one second after it
        validation.reject_tokens_expiring_in_less_than = 1;

        Self {
            access: Keys::from_secret(&config.secret, config.expires_in_seconds),
            refresh: Keys::from_secret(&config.refresh_secret, config.refresh_expires_in_seconds),
            validation,
        }
    }

    pub fn access_ttl_seconds(&self) -> u64 {
        self.access.ttl_seconds
    }

    pub fn issue_access_token(&self, id: Uuid) -> Result<String, TokenError> {
        self.issue_at(TokenKind::Access, id, chrono::Utc::now().timestamp())
    }

    pub fn issue_refresh_token(&self, id: Uuid) -> Result<String, TokenError> {
        self.issue_at(TokenKind::Refresh, id, chrono::Utc::now().timestamp())
    }

    pub fn verify_access_token(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify(TokenKind::Access, token)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify(TokenKind::Refresh, token)
    }

    /// Payload of a token without checking anything. Diagnostics only.
    pub fn decode_unsafe(token: &str) -> Option<serde_json::Value> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn issue_at(&self, kind: TokenKind, id: Uuid, issued_at: i64) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        let claims = Claims {
            id,
            kind: (kind == TokenKind::Refresh).then(|| REFRESH_KIND.to_string()),
            iat: issued_at,
            exp: issued_at.saturating_add(i64::try_from(keys.ttl_seconds).unwrap_or(i64::MAX)),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)?;
        let claims = data.claims;

        let is_refresh = claims.kind.as_deref() == Some(REFRESH_KIND);
        match kind {
            TokenKind::Access if is_refresh => return Err(TokenError::Invalid),
            TokenKind::Refresh if !is_refresh => return Err(TokenError::Invalid),
            _ => {}
        }

        Ok(VerifiedToken { id: claims.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, refresh_secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            expires_in_seconds: 60,
            refresh_secret: refresh_secret.into(),
            refresh_expires_in_seconds: 180,
            leeway_seconds: 0,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let svc = TokenService::new(&config("s1", "r1"));
        let id = Uuid::new_v4();

        let token = svc.issue_access_token(id).unwrap();
        assert_eq!(svc.verify_access_token(&token), Ok(VerifiedToken { id }));
    }

    #[test]
    fn refresh_token_round_trip_with_type_claim() {
        let svc = TokenService::new(&config("s1", "r1"));
        let id = Uuid::new_v4();

        let token = svc.issue_refresh_token(id).unwrap();
        assert_eq!(svc.verify_refresh_token(&token), Ok(VerifiedToken { id }));

        let payload = TokenService::decode_unsafe(&token).unwrap();
        assert_eq!(payload["type"], "refresh");
        assert_eq!(payload["id"], id.to_string());
        assert_eq!(
            payload["exp"].as_i64().unwrap() - payload["iat"].as_i64().unwrap(),
            180
        );
    }

    #[test]
    fn kinds_do_not_cross_with_separate_secrets() {
        let svc = TokenService::new(&config("s1", "r1"));
        let id = Uuid::new_v4();

        let access = svc.issue_access_token(id).unwrap();
        let refresh = svc.issue_refresh_token(id).unwrap();
        assert_eq!(svc.verify_refresh_token(&access), Err(TokenError::Invalid));
        assert_eq!(svc.verify_access_token(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn kinds_do_not_cross_with_shared_secret() {
        let svc = TokenService::new(&config("same", "same"));
        let id = Uuid::new_v4();

        let access = svc.issue_access_token(id).unwrap();
        let refresh = svc.issue_refresh_token(id).unwrap();
        assert_eq!(svc.verify_refresh_token(&access), Err(TokenError::Invalid));
        assert_eq!(svc.verify_access_token(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let svc = TokenService::new(&config("s1", "r1"));
        let an_hour_ago = chrono::Utc::now().timestamp() - 3600;

        let token = svc
            .issue_at(TokenKind::Access, Uuid::new_v4(), an_hour_ago)
            .unwrap();
        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn zero_lifetime_token_is_already_expired() {
        let mut cfg = config("s1", "r1");
        cfg.expires_in_seconds = 0;
        let svc = TokenService::new(&cfg);

        let token = svc.issue_access_token(Uuid::new_v4()).unwrap();
        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_expiring_this_second_is_expired() {
        let svc = TokenService::new(&config("s1", "r1"));
        // exp == now
        let issued = chrono::Utc::now().timestamp() - 60;

        let token = svc.issue_at(TokenKind::Access, Uuid::new_v4(), issued).unwrap();
        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn leeway_admits_recently_expired_token() {
        let mut cfg = config("s1", "r1");
        cfg.leeway_seconds = 600;
        let svc = TokenService::new(&cfg);
        let id = Uuid::new_v4();
        // expired 60s ago
        let issued = chrono::Utc::now().timestamp() - 120;

        let token = svc.issue_at(TokenKind::Access, id, issued).unwrap();
        assert_eq!(svc.verify_access_token(&token), Ok(VerifiedToken { id }));
    }

    #[test]
    fn wrong_secret_or_tampering_is_invalid() {
        let svc = TokenService::new(&config("s1", "r1"));
        let other = TokenService::new(&config("s2", "r2"));
        let token = other.issue_access_token(Uuid::new_v4()).unwrap();
        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Invalid));

        let mut tampered = svc.issue_access_token(Uuid::new_v4()).unwrap();
        tampered.push('x');
        assert_eq!(svc.verify_access_token(&tampered), Err(TokenError::Invalid));

        assert_eq!(svc.verify_access_token("garbage"), Err(TokenError::Invalid));
        assert_eq!(svc.verify_access_token(""), Err(TokenError::Invalid));
    }

    #[test]
    fn future_nbf_is_not_yet_valid() {
        let svc = TokenService::new(&config("s1", "r1"));
        let now = chrono::Utc::now().timestamp();
        let claims = serde_json::json!({
            "id": Uuid::new_v4(),
            "iat": now,
            "nbf": now + 3600,
            "exp": now + 7200,
        });
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"s1"),
        )
        .unwrap();

        assert_eq!(svc.verify_access_token(&token), Err(TokenError::NotYetValid));
    }

    #[test]
    fn decode_unsafe_reads_without_verifying() {
        let other = TokenService::new(&config("s2", "r2"));
        let id = Uuid::new_v4();
        let token = other.issue_access_token(id).unwrap();

        let payload = TokenService::decode_unsafe(&token).unwrap();
        assert_eq!(payload["id"], id.to_string());
        assert!(payload.get("type").is_none());

        assert_eq!(TokenService::decode_unsafe("not-a-token"), None);
        assert_eq!(TokenService::decode_unsafe("a.@@@.c"), None);
    }
}
