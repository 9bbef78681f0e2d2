use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::{UserChanges, UserService};
use crate::validation;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

/// GET /api/users/me
pub async fn me_get(Extension(auth_user): Extension<AuthUser>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(auth_user.user))
}

/// PUT /api/users/me
///
/// A new password is only accepted together with the current one.
pub async fn me_put(
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpdateMeRequest>,
) -> ApiResult<UserProfile> {
    let mut changes = UserChanges {
        first_name: validation::text_if_present("firstName", body.first_name.as_deref())?,
        last_name: validation::text_if_present("lastName", body.last_name.as_deref())?,
        location: validation::optional_text("location", body.location.as_deref())?,
        ..Default::default()
    };

    let users = UserService::new().await?;

    if body.password.is_some() {
        let password = validation::password("password", body.password.as_deref())?;
        let current = body
            .current_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::field_error("currentPassword", "currentPassword is required"))?;

        let stored = users
            .find_by_id(auth_user.user.id)
            .await?
            .ok_or_else(|| ApiError::invalid_token("Invalid token"))?;
        if !auth::verify_password(&current, &stored.password_hash).await? {
            return Err(ApiError::field_error("currentPassword", "Current password is incorrect"));
        }
        changes.password_hash = Some(auth::hash_password(&password).await?);
    }

    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let password_changed = changes.password_hash.is_some();
    let user = users.update(auth_user.user.id, changes).await?;
    info!(
        "User {} updated own profile{}",
        user.username,
        if password_changed { " and password" } else { "" }
    );
    Ok(ApiResponse::success(user.into()))
}

/// POST /api/users/logout - revoke the token used for this request
pub async fn logout(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Value> {
    UserService::new()
        .await?
        .revoke_token(auth_user.user.id, &auth_user.token_digest)
        .await?;

    info!("User {} logged out", auth_user.user.username);
    Ok(ApiResponse::success(json!({ "message": "Logged out" })))
}

/// POST /api/users/logout-all - revoke every token issued to the caller
pub async fn logout_all(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Value> {
    UserService::new().await?.revoke_all_tokens(auth_user.user.id).await?;

    info!("User {} logged out of all sessions", auth_user.user.username);
    Ok(ApiResponse::success(json!({ "message": "Logged out of all sessions" })))
}
