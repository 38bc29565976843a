use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: Uuid,
    /// Issue time, seconds since epoch.
    pub iat: i64,
    /// Random per-token id, so two tokens for the same user never collide.
    pub jti: Uuid,
    /// Expiry, only present when a token lifetime is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// HS256 signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Option<Duration>,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Option<Duration>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_hours.map(Duration::hours))
    }

    /// Signs a fresh token for `user_id`.
    pub fn sign(&self, user_id: Uuid) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
            exp: self.ttl.map(|ttl| (now + ttl).timestamp()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Checks the signature (and expiry, when present) and returns the claims.
    /// A `sub` that is missing or not a UUID fails here as well.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        if self.ttl.is_some() {
            validation.set_required_spec_claims(&["sub", "exp"]);
        } else {
            validation.set_required_spec_claims(&["sub"]);
        }
        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}
