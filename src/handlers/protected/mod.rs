// handlers/protected/mod.rs - Handlers behind `require_auth`
//
// Every handler here can rely on an `AuthUser` extension being present.

pub mod me;
pub mod passengers;
