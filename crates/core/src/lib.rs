//! # OfficeHours Core
//!
//! Domain types and pure scheduling logic shared by the storage and API
//! crates: appointment lifecycle rules, the dashboard ordering policy and
//! the statistics aggregator. Nothing in here performs I/O.

pub mod clock;
pub mod errors;
pub mod models;
pub mod policy;
pub mod stats;
