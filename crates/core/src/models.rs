pub mod appointment;
pub mod identity;
pub mod slot;
pub mod stats;
