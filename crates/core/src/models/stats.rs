use serde::{Deserialize, Serialize};

/// Derived counters for the teacher dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_appointments: usize,
    pub pending_requests: usize,
    pub approved_today: usize,
    pub approved_yesterday: usize,
    /// `approved_today - approved_yesterday`
    pub approved_delta: i64,
    pub total_students: usize,
    /// Percentage change of weekly volume, `0.0` when last week was empty.
    pub weekly_change: f64,
}
