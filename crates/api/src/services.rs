//! Scheduling services shared by all request handlers.

pub mod appointments;
pub mod availability;
pub mod notifications;
pub mod profiles;
pub mod stats;

pub use appointments::AppointmentService;
pub use availability::AvailabilityService;
pub use notifications::{AppointmentEvent, NotificationBus};
pub use profiles::ProfileService;
pub use stats::StatsService;
