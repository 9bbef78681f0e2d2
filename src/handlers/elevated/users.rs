// handlers/elevated/users.rs - Account administration

use axum::{extract::Path, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::handlers::public::users::username_taken;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::{UserChanges, UserService};
use crate::validation;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub is_admin: Option<Value>,
}

impl AdminUpdateUserRequest {
    async fn into_changes(self) -> Result<UserChanges, ApiError> {
        let password_hash = match body_password(self.password.as_deref())? {
            Some(password) => Some(auth::hash_password(&password).await?),
            None => None,
        };

        Ok(UserChanges {
            username: self
                .username
                .as_deref()
                .map(|name| validation::username(Some(name)))
                .transpose()?,
            password_hash,
            first_name: validation::text_if_present("firstName", self.first_name.as_deref())?,
            last_name: validation::text_if_present("lastName", self.last_name.as_deref())?,
            location: validation::optional_text("location", self.location.as_deref())?,
            is_admin: self
                .is_admin
                .as_ref()
                .filter(|v| !v.is_null())
                .map(|v| validation::coerce_bool("isAdmin", v))
                .transpose()?,
        })
    }
}

fn body_password(value: Option<&str>) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(_) => Ok(Some(validation::password("password", value)?)),
    }
}

/// GET /api/users
pub async fn list() -> ApiResult<Vec<UserProfile>> {
    let users = UserService::new().await?.list().await?;
    Ok(ApiResponse::success(users.into_iter().map(UserProfile::from).collect()))
}

/// GET /api/users/:id
pub async fn get(Path(id): Path<String>) -> ApiResult<UserProfile> {
    let id = validation::id("id", &id)?;
    let user = UserService::new()
        .await?
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(user.into()))
}

/// PUT /api/users/:id
pub async fn update(
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AdminUpdateUserRequest>,
) -> ApiResult<UserProfile> {
    let id = validation::id("id", &id)?;
    let changes = body.into_changes().await?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let user = UserService::new()
        .await?
        .update(id, changes)
        .await
        .map_err(username_taken)?;

    info!("User {} updated by admin {}", user.username, admin.user.username);
    Ok(ApiResponse::success(user.into()))
}

/// DELETE /api/users/:id
pub async fn delete(Extension(admin): Extension<AuthUser>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = validation::id("id", &id)?;
    if id == admin.user.id {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }

    UserService::new().await?.delete(id).await?;
    info!("User {} deleted by admin {}", id, admin.user.username);
    Ok(ApiResponse::success(json!({ "message": "User deleted", "id": id })))
}
