//! JWT credentials and password hashing
//!
//! Access tokens are short-lived bearer credentials; refresh tokens are
//! long-lived, stored on the user row (at most one live value), and
//! rotated on every refresh.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::UserStore;
use crate::error::ApiError;
use crate::AppState;

const ACCESS_TOKEN_TTL_HOURS: i64 = 1;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub exp: i64,
}

pub fn create_access_token(user_id: Uuid, email: &str, secret: &str) -> Result<String, ApiError> {
    let claims = AccessClaims {
        sub: user_id,
        email: email.to_string(),
        exp: (Utc::now() + Duration::hours(ACCESS_TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn create_refresh_token(user_id: Uuid, secret: &str) -> Result<String, ApiError> {
    let claims = RefreshClaims {
        sub: user_id,
        exp: (Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn verify_access_token(token: &str, secret: &str) -> Result<AccessClaims, ApiError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))
}

pub fn verify_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, ApiError> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, hash).map_err(|e| ApiError::Internal(e.to_string()))
}

/// Authenticated caller, resolved from the bearer token. Extraction fails
/// with 401 when the token is missing, invalid, or names a user that no
/// longer exists.
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Auth("Unauthorized, token missing".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Auth("Unauthorized, token missing".to_string()))?;

        let claims = verify_access_token(token, &state.config.access_token_secret)?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Auth("Unauthorized, user not found".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }
}
