//! Session tokens for docflow accounts.
//!
//! A sign-in yields an [`IssuedTokens`] pair: a short-lived HS256 access JWT
//! carrying [`Claims`], and an opaque refresh [`OpaqueToken`]. Password reset
//! links use the same opaque token shape. Only SHA-256 digests of opaque
//! tokens are persisted.

use chrono::{DateTime, Duration, Utc};
use docflow_core::types::DbId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// `iss` claim stamped on and required of every access token.
pub const TOKEN_ISSUER: &str = "docflow";

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

/// Entropy of an opaque token, hex-encoded to twice this length.
const OPAQUE_TOKEN_BYTES: usize = 32;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// `"admin"` or `"user"`.
    pub role: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Read `JWT_SECRET` (required), `JWT_ACCESS_EXPIRY_MINS` (default 15)
    /// and `JWT_REFRESH_EXPIRY_DAYS` (default 7).
    ///
    /// # Panics
    ///
    /// Panics if the secret is missing or empty, or an expiry is not an integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        Self {
            secret,
            access_token_expiry_mins: env_i64("JWT_ACCESS_EXPIRY_MINS", DEFAULT_ACCESS_EXPIRY_MINS),
            refresh_token_expiry_days: env_i64(
                "JWT_REFRESH_EXPIRY_DAYS",
                DEFAULT_REFRESH_EXPIRY_DAYS,
            ),
        }
    }

    /// Access token lifetime in seconds, as reported to clients.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    /// Issue a fresh access/refresh pair for a user.
    pub fn issue(
        &self,
        user_id: DbId,
        role: &str,
    ) -> Result<IssuedTokens, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            exp: (now + Duration::minutes(self.access_token_expiry_mins)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(IssuedTokens {
            access_token,
            refresh: OpaqueToken::generate(),
            refresh_expires_at: now + Duration::days(self.refresh_token_expiry_days),
        })
    }

    /// Check signature, expiry and issuer of an access token.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid integer, got '{raw}'")),
        Err(_) => default,
    }
}

/// Tokens handed to a client after sign-up, sign-in or refresh.
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh: OpaqueToken,
    pub refresh_expires_at: DateTime<Utc>,
}

/// A random bearer secret and the digest stored in its place.
#[derive(Debug, Clone)]
pub struct OpaqueToken {
    pub plaintext: String,
    pub hash: String,
}

impl OpaqueToken {
    /// Draw a new token from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let bytes: [u8; OPAQUE_TOKEN_BYTES] = rand::rng().random();
        let plaintext: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let hash = hash_token(&plaintext);
        Self { plaintext, hash }
    }
}

/// SHA-256 hex digest used to look up an opaque token.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "docflow-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn issued_access_token_verifies() {
        let config = config();
        let issued = config.issue(42, "admin").expect("issue");

        let claims = config.verify(&issued.access_token).expect("verify");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, config.access_ttl_secs());
        assert!(issued.refresh_expires_at > Utc::now() + Duration::days(6));
    }

    #[test]
    fn refresh_token_is_stored_as_digest() {
        let issued = config().issue(1, "user").expect("issue");
        assert_eq!(issued.refresh.hash, hash_token(&issued.refresh.plaintext));
        assert_ne!(issued.refresh.hash, issued.refresh.plaintext);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "user".to_string(),
            iss: TOKEN_ISSUER.to_string(),
            // Past the 60 s default leeway.
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encode");

        assert!(config.verify(&token).is_err());
    }

    #[test]
    fn foreign_issuer_or_secret_is_rejected() {
        let config = config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "admin".to_string(),
            iss: "someone-else".to_string(),
            exp: now + 300,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encode");
        assert!(config.verify(&token).is_err());

        let other = JwtConfig {
            secret: "another-secret".to_string(),
            ..config.clone()
        };
        let issued = config.issue(1, "user").expect("issue");
        assert!(other.verify(&issued.access_token).is_err());
    }

    #[test]
    fn opaque_tokens_are_random_hex() {
        let a = OpaqueToken::generate();
        let b = OpaqueToken::generate();
        assert_eq!(a.plaintext.len(), OPAQUE_TOKEN_BYTES * 2);
        assert!(a.plaintext.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.plaintext, b.plaintext);
        assert_eq!(a.hash.len(), 64);
    }
}
