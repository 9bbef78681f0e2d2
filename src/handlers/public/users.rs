// handlers/public/users.rs - Account creation, login and password reset

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{self, Claims};
use crate::config;
use crate::database::models::{User, UserProfile};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::{NewUser, UserService};
use crate::validation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// Duplicate usernames get a specific message instead of the generic conflict
pub(crate) fn username_taken(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::Conflict(_) => ApiError::conflict("Username already exists"),
        other => other.into(),
    }
}

/// Sign a token for `user` and remember its digest on the account
pub(crate) async fn issue_session(users: &UserService, user: User) -> Result<Session, ApiError> {
    let security = &config::config().security;
    let claims = Claims::new(user.id, user.username.clone(), user.is_admin);
    let token = auth::generate_jwt(&claims)?;

    let user = users
        .record_login(user.id, &auth::token_digest(&token), security.max_tokens_per_user)
        .await?;

    Ok(Session {
        user: user.into(),
        token,
        expires_in: security.jwt_expiry_hours * 3600,
    })
}

/// POST /api/users/register
pub async fn register(ApiJson(body): ApiJson<RegisterRequest>) -> ApiResult<Session> {
    let username = validation::username(body.username.as_deref())?;
    let password = validation::password("password", body.password.as_deref())?;
    let first_name = validation::required_text("firstName", body.first_name.as_deref())?;
    let last_name = validation::required_text("lastName", body.last_name.as_deref())?;

    let users = UserService::new().await?;
    let user = users
        .create(NewUser {
            username,
            password_hash: auth::hash_password(&password).await?,
            first_name,
            last_name,
            location: validation::optional_text("location", body.location.as_deref())?,
            is_admin: false,
        })
        .await
        .map_err(username_taken)?;

    info!("Registered user {}", user.username);
    let session = issue_session(&users, user).await?;
    Ok(ApiResponse::created(session))
}

/// POST /api/users/login
pub async fn login(ApiJson(body): ApiJson<LoginRequest>) -> ApiResult<Session> {
    let username = validation::required_text("username", body.username.as_deref())?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::field_error("password", "password is required"))?;

    let invalid = || ApiError::unauthorized("Invalid username or password");

    let users = UserService::new().await?;
    let Some(user) = users.find_by_username(&username).await? else {
        warn!("Login attempt for unknown user {}", username);
        return Err(invalid());
    };

    if !auth::verify_password(&password, &user.password_hash).await? {
        warn!("Failed login for {}", username);
        return Err(invalid());
    }

    let session = issue_session(&users, user).await?;
    info!("User {} logged in", session.user.username);
    Ok(ApiResponse::success(session))
}

/// POST /api/users/password/forgot
///
/// The response is the same whether or not the account exists. Outside
/// development the token is never returned; delivering it is left to an
/// out-of-band channel.
pub async fn password_forgot(ApiJson(body): ApiJson<ForgotPasswordRequest>) -> ApiResult<Value> {
    let username = validation::required_text("username", body.username.as_deref())?;
    let minutes = config::config().security.password_reset_expiry_minutes;

    let token = auth::generate_reset_token();
    let expires = Utc::now() + Duration::minutes(minutes);

    let users = UserService::new().await?;
    let issued = users
        .set_reset_token(&username, &auth::token_digest(&token), expires)
        .await?;

    let mut data = json!({
        "message": "If the account exists, a password reset token has been issued"
    });

    if issued {
        info!("Issued password reset token for {}", username);
        if crate::is_development!() {
            data["resetToken"] = json!(token);
            data["expiresAt"] = json!(expires);
        }
    } else {
        warn!("Password reset requested for unknown user {}", username);
    }

    Ok(ApiResponse::success(data))
}

/// POST /api/users/password/reset
pub async fn password_reset(ApiJson(body): ApiJson<ResetPasswordRequest>) -> ApiResult<Value> {
    let token = validation::required_text("token", body.token.as_deref())?;
    let password = validation::password("password", body.password.as_deref())?;

    let users = UserService::new().await?;
    let user = users
        .reset_password(&auth::token_digest(&token), &auth::hash_password(&password).await?)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;

    info!("Password reset for {}; all sessions revoked", user.username);
    Ok(ApiResponse::success(json!({ "message": "Password has been reset" })))
}
