pub mod passenger;
pub mod site;
pub mod trip;
pub mod user;

pub use passenger::Passenger;
pub use site::Site;
pub use trip::Trip;
pub use user::{User, UserProfile};
