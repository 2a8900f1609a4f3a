use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sub-second digits a stored timestamp keeps; PostgreSQL `timestamptz`
/// resolves to microseconds.
pub const TIMESTAMP_PRECISION: u16 = 6;

/// Truncates `at` to the precision every store can represent, so that two
/// timestamps name the same slot in memory exactly when they do in SQL.
pub fn normalize_timestamp(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(TIMESTAMP_PRECISION)
}

/// An open time slot a teacher has published for booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub teacher_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    /// A slot is open only while its start lies strictly in the future.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at > now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotResponse {
    pub teacher_id: Uuid,
    pub starts_at: DateTime<Utc>,
}

impl From<Slot> for SlotResponse {
    fn from(slot: Slot) -> Self {
        Self {
            teacher_id: slot.teacher_id,
            starts_at: slot.starts_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSlotsResponse {
    pub teacher_id: Uuid,
    pub slots: Vec<DateTime<Utc>>,
}
