//! Token and password primitives shared by the login handlers and the
//! authentication middleware.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub username: String,
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
    /// Unique per issued token, so two sessions never share a digest
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, admin: bool) -> Self {
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self::with_lifetime(user_id, username, admin, Duration::hours(expiry_hours as i64))
    }

    pub fn with_lifetime(user_id: Uuid, username: String, admin: bool, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username,
            admin,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("JWT secret not configured")]
    SecretMissing,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("password hashing error: {0}")]
    Hashing(String),
}

fn secret() -> Result<&'static [u8], AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::SecretMissing);
    }
    Ok(secret.as_bytes())
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    generate_jwt_with_secret(claims, secret()?)
}

pub fn generate_jwt_with_secret(claims: &Claims, secret: &[u8]) -> Result<String, AuthError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the claims on success
pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    validate_jwt_with_secret(token, secret()?)
}

pub fn validate_jwt_with_secret(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    let validation = Validation::default();
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::Malformed(e.to_string()),
        })
}

/// bcrypt is CPU bound; it runs on the blocking pool
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    let cost = config::config().security.bcrypt_cost;
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(format!("hashing task failed: {e}")))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(format!("verification task failed: {e}")))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Hex SHA-256 digest. Issued bearer tokens and reset tokens are only
/// stored in this form.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Random single-use token for password resets
pub fn generate_reset_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
