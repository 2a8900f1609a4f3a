use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::SchedulingError;
use crate::models::identity::UserProfile;

/// Longest purpose text a student may attach to a booking.
pub const MAX_PURPOSE_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Canceled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Approved,
        AppointmentStatus::Canceled,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Approved => "approved",
            AppointmentStatus::Canceled => "canceled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Canceled | AppointmentStatus::Completed
        )
    }

    /// The edge set of the appointment lifecycle.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (*self, next),
            (Pending, Approved) | (Pending, Canceled) | (Approved, Canceled) | (Approved, Completed)
        )
    }

    /// Decides whether a request to move from the stored status to
    /// `requested` may proceed.
    ///
    /// A request whose target already equals the stored status lost a race
    /// to an earlier writer and is reported as `Conflict`. `completed` never
    /// leaves, whatever the target.
    pub fn check_transition(&self, requested: AppointmentStatus) -> Result<(), SchedulingError> {
        let invalid = SchedulingError::InvalidTransition {
            from: *self,
            to: requested,
        };
        match (*self, requested) {
            (AppointmentStatus::Completed, _) => Err(invalid),
            (_, AppointmentStatus::Pending) => Err(invalid),
            (current, next) if current == next => Err(SchedulingError::Conflict(format!(
                "appointment is already {}",
                current
            ))),
            (current, next) if current.can_transition_to(next) => Ok(()),
            _ => Err(invalid),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "approved" => Ok(AppointmentStatus::Approved),
            "canceled" | "cancelled" => Ok(AppointmentStatus::Canceled),
            "completed" => Ok(AppointmentStatus::Completed),
            other => Err(SchedulingError::Validation(format!(
                "Unknown appointment status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub purpose: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub auto_updated: bool,
    pub auto_updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// An approved session whose time has fully elapsed is due to be
    /// completed automatically.
    pub fn auto_completion_due(&self, now: DateTime<Utc>, session: Duration) -> bool {
        self.status == AppointmentStatus::Approved && now >= self.date_time + session
    }

    /// Approved sessions that have not started yet.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.status == AppointmentStatus::Approved && self.date_time > now
    }
}

/// Everything the store needs to create an appointment out of a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}

impl NewAppointment {
    pub fn into_appointment(self) -> Appointment {
        Appointment {
            id: self.id,
            teacher_id: self.teacher_id,
            student_id: self.student_id,
            date_time: self.date_time,
            purpose: self.purpose,
            status: AppointmentStatus::Pending,
            created_at: self.created_at,
            auto_updated: false,
            auto_updated_at: None,
        }
    }
}

/// The new values written by a compare-and-set on the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: AppointmentStatus,
    pub auto_updated: bool,
    pub auto_updated_at: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn manual(status: AppointmentStatus) -> Self {
        Self {
            status,
            auto_updated: false,
            auto_updated_at: None,
        }
    }

    pub fn auto_complete(at: DateTime<Utc>) -> Self {
        Self {
            status: AppointmentStatus::Completed,
            auto_updated: true,
            auto_updated_at: Some(at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: AppointmentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

/// An appointment together with the student details the dashboard shows
/// and searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub student_name: String,
    pub student_email: String,
}

impl AppointmentView {
    pub fn new(appointment: Appointment, student: Option<&UserProfile>) -> Self {
        let (student_name, student_email) = student
            .map(|p| (p.name.clone(), p.email.clone()))
            .unwrap_or_default();
        Self {
            appointment,
            student_name,
            student_email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub teacher_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}
