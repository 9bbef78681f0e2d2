use axum::{extract::Request, middleware::Next, response::Response};
use tracing::warn;

use super::auth::AuthUser;
use crate::error::ApiError;

/// Gate on the admin flag of the identity attached by `require_auth`.
/// Must be layered inside it.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(auth_user) = request.extensions().get::<AuthUser>() else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    if !auth_user.is_admin() {
        warn!(
            "User {} denied admin access to {} {}",
            auth_user.user.username,
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}
