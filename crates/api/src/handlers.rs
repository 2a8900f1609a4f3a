pub mod appointments;
pub mod availability;
pub mod stats;
pub mod users;
