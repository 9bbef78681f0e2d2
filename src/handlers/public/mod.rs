// handlers/public/mod.rs - Handlers reachable without a token
//
// Trip and site handlers sit behind `optional_auth`; the identity, when
// present, is only logged.

pub mod health;
pub mod sites;
pub mod trips;
pub mod users;
