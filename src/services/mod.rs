// One service per entity. Each holds a handle to the shared pool and runs
// every statement through `DatabaseManager::run`.

pub mod passenger_service;
pub mod site_service;
pub mod trip_service;
pub mod user_service;

pub use passenger_service::{NewPassenger, PassengerChanges, PassengerService};
pub use site_service::{Initialized, SiteInsert, SiteService, SiteUpdate};
pub use trip_service::{Decrement, NewTrip, TripChanges, TripFilter, TripService};
pub use user_service::{NewUser, UserChanges, UserService};
