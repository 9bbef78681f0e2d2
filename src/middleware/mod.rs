pub mod admin;
pub mod auth;
pub mod response;

pub use admin::require_admin;
pub use auth::{optional_auth, require_auth, AuthUser};
pub use response::{ApiJson, ApiResponse, ApiResult};
