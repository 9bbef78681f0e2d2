// handlers/elevated/mod.rs - Handlers behind `require_auth` + `require_admin`

pub mod passengers;
pub mod users;
