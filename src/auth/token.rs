use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::SecurityConfig;

use super::AuthError;

/// Upper bound on configured lifetimes so `now + ttl` cannot overflow.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub kind: TokenKind,
    /// Random per-token id so two tokens minted in the same second still differ.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(rename = "token")]
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies session tokens. Holds no per-user state: persisting
/// refresh tokens is the caller's job.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(security: &SecurityConfig) -> Self {
        let secret = security.jwt_secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl: ttl(security.access_token_expiry_secs),
            refresh_ttl: ttl(security.refresh_token_expiry_secs),
        }
    }

    /// Mint an access/refresh pair for the same user
    pub fn issue(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.sign(user_id, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify(token, TokenKind::Access)
            .ok_or(AuthError::InvalidToken)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify(token, TokenKind::Refresh)
            .ok_or(AuthError::InvalidRefreshToken)
    }

    fn sign(&self, user_id: Uuid, kind: TokenKind, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Option<Uuid> {
        let data = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Rejected {:?} token: {}", expected, e);
                return None;
            }
        };

        if data.claims.kind != expected {
            tracing::debug!("Rejected token: expected {:?}, got {:?}", expected, data.claims.kind);
            return None;
        }

        Some(data.claims.user_id)
    }
}

fn ttl(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_TTL_SECS) as i64)
}

/// Stored form of a refresh token: lowercase hex SHA-256.
pub fn fingerprint(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn service_with_secret(secret: &str) -> TokenService {
        let mut config = AppConfig::development();
        config.security.jwt_secret = secret.to_string();
        TokenService::new(&config.security)
    }

    #[test]
    fn issued_pair_verifies_by_kind() {
        let service = service_with_secret("test_secret_key_123");
        let user_id = Uuid::new_v4();
        let pair = service.issue(user_id).unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(service.verify_access(&pair.access_token).unwrap(), user_id);
        assert_eq!(service.verify_refresh(&pair.refresh_token).unwrap(), user_id);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let service = service_with_secret("test_secret_key_123");
        let pair = service.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(
            service.verify_access(&pair.refresh_token),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            service.verify_refresh(&pair.access_token),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = service_with_secret("test_secret_key_123");
        let theirs = service_with_secret("someone_else");
        let pair = theirs.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(ours.verify_access(&pair.access_token), Err(AuthError::InvalidToken)));
        assert!(matches!(
            ours.verify_refresh(&pair.refresh_token),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn tampered_and_malformed_tokens_are_rejected() {
        let service = service_with_secret("test_secret_key_123");
        let pair = service.issue(Uuid::new_v4()).unwrap();

        let appended = format!("{}garbage", pair.access_token);
        assert!(service.verify_access(&appended).is_err());
        assert!(service.verify_access("not-a-jwt").is_err());
        assert!(service.verify_access("").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = service_with_secret("test_secret_key_123");
        let token = service
            .sign(Uuid::new_v4(), TokenKind::Access, Duration::seconds(-30))
            .unwrap();
        assert!(matches!(service.verify_access(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_refresh_token_is_rejected() {
        let service = service_with_secret("test_secret_key_123");
        let token = service
            .sign(Uuid::new_v4(), TokenKind::Refresh, Duration::seconds(-30))
            .unwrap();
        assert!(matches!(
            service.verify_refresh(&token),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn same_second_issues_are_distinct() {
        let service = service_with_secret("test_secret_key_123");
        let user_id = Uuid::new_v4();
        let first = service.issue(user_id).unwrap();
        let second = service.issue(user_id).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(fingerprint(&first.refresh_token), fingerprint(&second.refresh_token));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let fp = fingerprint("abc");
        assert_eq!(fp, fingerprint("abc"));
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn lifetimes_come_from_config() {
        let mut config = AppConfig::development();
        config.security.access_token_expiry_secs = 90;
        let service = TokenService::new(&config.security);
        let token = service.issue(Uuid::new_v4()).unwrap().access_token;
        let data = decode::<Claims>(&token, &service.decoding_key, &service.validation).unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 90);
    }
}
