// handlers/mod.rs - Handler tiers
//
// Public (no auth, or optional auth used only for audit logging)
//   → Protected (bearer token required)
//   → Elevated (bearer token of an admin user)
//
// The tier decides which middleware stack `routes` wraps a handler in;
// handlers themselves only read the `AuthUser` extension.

pub mod elevated;
pub mod protected;
pub mod public;

use axum::Extension;

use crate::middleware::AuthUser;

/// Username for audit log lines on optionally authenticated routes
pub(crate) fn actor(user: &Option<Extension<AuthUser>>) -> &str {
    user.as_ref()
        .map(|Extension(auth)| auth.user.username.as_str())
        .unwrap_or("anonymous")
}
