use chrono::{DateTime, Utc};
use eyre::{Report, Result};
use officehours_core::models::{
    appointment::Appointment,
    identity::UserProfile,
    slot::Slot,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlot {
    pub teacher_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub purpose: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub auto_updated: bool,
    pub auto_updated_at: Option<DateTime<Utc>>,
}

impl From<DbSlot> for Slot {
    fn from(row: DbSlot) -> Self {
        Slot {
            teacher_id: row.teacher_id,
            starts_at: row.starts_at,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<DbUser> for UserProfile {
    type Error = Report;

    fn try_from(row: DbUser) -> Result<Self> {
        Ok(UserProfile {
            id: row.id,
            kind: row
                .kind
                .parse()
                .map_err(|e| eyre::eyre!("Corrupt user row {}: {}", row.id, e))?,
            name: row.name,
            email: row.email,
        })
    }
}

impl TryFrom<DbAppointment> for Appointment {
    type Error = Report;

    fn try_from(row: DbAppointment) -> Result<Self> {
        Ok(Appointment {
            id: row.id,
            teacher_id: row.teacher_id,
            student_id: row.student_id,
            date_time: row.date_time,
            purpose: row.purpose,
            status: row
                .status
                .parse()
                .map_err(|e| eyre::eyre!("Corrupt appointment row {}: {}", row.id, e))?,
            created_at: row.created_at,
            auto_updated: row.auto_updated,
            auto_updated_at: row.auto_updated_at,
        })
    }
}

/// Converts a batch of appointment rows, failing on the first corrupt one.
pub fn into_appointments(rows: Vec<DbAppointment>) -> Result<Vec<Appointment>> {
    rows.into_iter().map(Appointment::try_from).collect()
}
