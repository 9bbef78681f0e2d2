use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{token_digest, validate_jwt};
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::services::UserService;

/// Identity attached to an authenticated request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: UserProfile,
    /// Digest of the presented bearer token, used by logout
    pub token_digest: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }
}

/// Reject the request unless it carries a valid bearer token for an
/// existing user
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = authenticate(request.headers()).await.map_err(|err| {
        warn!("Authentication failed for {} {}: {}", request.method(), request.uri().path(), err);
        err
    })?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Attach an identity when one can be established; never rejects
pub async fn optional_auth(mut request: Request, next: Next) -> Response {
    if request.headers().contains_key(AUTHORIZATION) {
        match authenticate(request.headers()).await {
            Ok(auth_user) => {
                request.extensions_mut().insert(auth_user);
            }
            Err(err) => debug!("Continuing without identity: {}", err),
        }
    }
    next.run(request).await
}

async fn authenticate(headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = extract_bearer(headers)?;
    let claims = validate_jwt(token)?;

    let digest = token_digest(token);
    let user = UserService::new()
        .await?
        .find_by_token(claims.sub, &digest)
        .await?
        .ok_or_else(|| ApiError::invalid_token("Invalid token"))?;

    Ok(AuthUser {
        user: user.into(),
        token_digest: digest,
    })
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::invalid_token("Invalid token format"))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::invalid_token("Invalid token format"))?
        .trim();

    if token.is_empty() {
        return Err(ApiError::invalid_token("Invalid token"));
    }
    Ok(token)
}
