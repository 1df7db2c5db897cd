pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Bearer token payload. `sub` always equals `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Token lifetime of {0} hours is out of range")]
    InvalidLifetime(u64),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

/// Signs and verifies HS256 tokens. Stateless: a token stays valid until it expires.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(security: &SecurityConfig) -> Result<Self, AuthError> {
        if security.jwt_secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let lifetime = i64::try_from(security.jwt_expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
            .ok_or(AuthError::InvalidLifetime(security.jwt_expiry_hours))?;

        let secret = security.jwt_secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: security.jwt_issuer.clone(),
            lifetime,
        })
    }

    pub fn issue(&self, user_id: Uuid, email: &str, username: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            email: email.to_string(),
            username: username.to_string(),
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;

        tracing::debug!(
            "Generated JWT for user {}, expires at {}",
            email,
            (now + self.lifetime).to_rfc3339()
        );
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let claims = token_data.claims;
        if claims.sub != claims.user_id.to_string() {
            return Err(AuthError::InvalidToken("subject does not match user id".to_string()));
        }

        Ok(claims)
    }
}
