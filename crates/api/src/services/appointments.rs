//! # Appointments
//!
//! Booking, the status state machine and the teacher queue.
//!
//! ## Lifecycle
//!
//! ```text
//! pending ──► approved ──► completed
//!    │            │
//!    └──► canceled ◄┘
//! ```
//!
//! Every status write is a compare-and-set on the status the caller observed,
//! so of two concurrent requests starting from the same status only one is
//! applied and the other gets `Conflict`.
//!
//! ## Auto-completion
//!
//! An approved appointment whose session has ended is moved to `completed`
//! the next time anything reads it. The change is persisted with
//! `auto_updated = true` so later readers see the same record.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use officehours_core::{
    clock::Clock,
    errors::{SchedulingError, SchedulingResult},
    models::{
        appointment::{
            Appointment, AppointmentStatus, AppointmentView, MAX_PURPOSE_LEN, NewAppointment,
            StatusChange, StatusFilter,
        },
        identity::{Identity, UserProfile},
        slot::normalize_timestamp,
    },
    policy,
};
use officehours_db::SchedulingStore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::notifications::{AppointmentEvent, NotificationBus};

#[derive(Clone)]
pub struct AppointmentService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
    notifications: NotificationBus,
    session_duration: Duration,
}

impl AppointmentService {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        clock: Arc<dyn Clock>,
        notifications: NotificationBus,
        session_duration: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            notifications,
            session_duration,
        }
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    /// Books an open slot for the calling student.
    ///
    /// The slot is consumed and the pending appointment created in one store
    /// operation; if the slot is gone nothing is written.
    ///
    /// # Errors
    ///
    /// * `Forbidden` - caller is not a student
    /// * `Validation` - purpose is blank or too long
    /// * `SlotUnavailable` - the teacher has no open slot at `starts_at`
    pub async fn book(
        &self,
        caller: &Identity,
        teacher_id: Uuid,
        starts_at: DateTime<Utc>,
        purpose: &str,
    ) -> SchedulingResult<Appointment> {
        let student_id = caller.require_student()?;
        let purpose = validate_purpose(purpose)?;
        let now = self.clock.now();
        let starts_at = normalize_timestamp(starts_at);

        let booking = NewAppointment {
            id: Uuid::new_v4(),
            teacher_id,
            student_id,
            date_time: starts_at,
            purpose,
            created_at: now,
        };

        let Some(appointment) = self.store.book_slot(booking, now).await? else {
            warn!(%teacher_id, %starts_at, %student_id, "booking rejected: slot not open");
            return Err(SchedulingError::SlotUnavailable(format!(
                "Teacher {} has no open slot at {}",
                teacher_id, starts_at
            )));
        };

        info!(appointment_id = %appointment.id, %teacher_id, %student_id, "appointment booked");
        self.notifications.publish(AppointmentEvent::Booked {
            appointment: appointment.clone(),
        });
        Ok(appointment)
    }

    /// Applies a teacher-driven status change.
    ///
    /// The stored record is settled first, exactly as any read would settle
    /// it: an elapsed approved session is persisted as `completed` even when
    /// the requested change is then rejected. The requested change itself is
    /// all-or-nothing; a rejected or lost transition writes nothing of its own.
    ///
    /// # Errors
    ///
    /// * `Forbidden` - caller is not the owning teacher
    /// * `NotFound` - no such appointment
    /// * `InvalidTransition` - the edge is not part of the lifecycle
    /// * `Conflict` - another request changed the status first
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        caller: &Identity,
        new_status: AppointmentStatus,
    ) -> SchedulingResult<Appointment> {
        let teacher_id = caller.require_teacher()?;
        let now = self.clock.now();

        let current = self.fetch(appointment_id).await?;
        if current.teacher_id != teacher_id {
            return Err(SchedulingError::Forbidden(format!(
                "Appointment {} belongs to another teacher",
                appointment_id
            )));
        }
        let current = self.settle(current, now).await?;

        if let Err(err) = current.status.check_transition(new_status) {
            warn!(%appointment_id, from = %current.status, to = %new_status, "transition rejected: {}", err);
            return Err(err);
        }

        let updated = self
            .store
            .compare_and_set_status(
                appointment_id,
                current.status,
                StatusChange::manual(new_status),
            )
            .await?
            .ok_or_else(|| {
                warn!(%appointment_id, expected = %current.status, "transition lost a concurrent update");
                SchedulingError::Conflict(format!(
                    "Appointment {} was modified concurrently; re-fetch and retry",
                    appointment_id
                ))
            })?;

        info!(%appointment_id, from = %current.status, to = %new_status, "appointment transitioned");
        self.notifications.publish(AppointmentEvent::StatusChanged {
            appointment: updated.clone(),
            from: current.status,
            to: new_status,
            automatic: false,
            at: now,
        });
        Ok(updated)
    }

    /// Reads one appointment on behalf of its teacher or its student.
    pub async fn get(&self, appointment_id: Uuid, caller: &Identity) -> SchedulingResult<Appointment> {
        let appointment = self.fetch(appointment_id).await?;
        let owner = if caller.is_teacher() {
            appointment.teacher_id
        } else {
            appointment.student_id
        };
        if owner != caller.id {
            return Err(SchedulingError::Forbidden(format!(
                "Appointment {} is not visible to {}",
                appointment_id, caller
            )));
        }
        self.settle(appointment, self.clock.now()).await
    }

    /// The teacher's dashboard queue: filtered, searched and ordered.
    pub async fn query(
        &self,
        caller: &Identity,
        filter: StatusFilter,
        search: &str,
    ) -> SchedulingResult<Vec<AppointmentView>> {
        let teacher_id = caller.require_teacher()?;
        let now = self.clock.now();

        let appointments = self.teacher_appointments(teacher_id, now).await?;
        let views = self.attach_students(appointments).await?;
        Ok(policy::rank(views, filter, search, now))
    }

    /// The calling student's own appointments, soonest first.
    pub async fn student_appointments(&self, caller: &Identity) -> SchedulingResult<Vec<Appointment>> {
        let student_id = caller.require_student()?;
        let now = self.clock.now();

        let appointments = self.store.student_appointments(student_id).await?;
        self.settle_all(appointments, now).await
    }

    /// All appointments of a teacher with auto-completion applied as of `now`.
    pub async fn teacher_appointments(
        &self,
        teacher_id: Uuid,
        now: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Appointment>> {
        let appointments = self.store.teacher_appointments(teacher_id).await?;
        self.settle_all(appointments, now).await
    }

    async fn fetch(&self, appointment_id: Uuid) -> SchedulingResult<Appointment> {
        self.store
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| {
                SchedulingError::NotFound(format!("Appointment {} not found", appointment_id))
            })
    }

    async fn settle_all(
        &self,
        appointments: Vec<Appointment>,
        now: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Appointment>> {
        let mut settled = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            settled.push(self.settle(appointment, now).await?);
        }
        Ok(settled)
    }

    /// Materializes auto-completion for an elapsed approved session.
    async fn settle(&self, appointment: Appointment, now: DateTime<Utc>) -> SchedulingResult<Appointment> {
        if !appointment.auto_completion_due(now, self.session_duration) {
            return Ok(appointment);
        }

        let id = appointment.id;
        match self
            .store
            .compare_and_set_status(id, AppointmentStatus::Approved, StatusChange::auto_complete(now))
            .await?
        {
            Some(completed) => {
                info!(appointment_id = %id, "appointment auto-completed");
                self.notifications.publish(AppointmentEvent::StatusChanged {
                    appointment: completed.clone(),
                    from: AppointmentStatus::Approved,
                    to: AppointmentStatus::Completed,
                    automatic: true,
                    at: now,
                });
                Ok(completed)
            }
            None => {
                // Someone else moved it first; report what is stored now.
                debug!(appointment_id = %id, "auto-completion raced, re-reading");
                self.fetch(id).await
            }
        }
    }

    async fn attach_students(
        &self,
        appointments: Vec<Appointment>,
    ) -> SchedulingResult<Vec<AppointmentView>> {
        let mut student_ids: Vec<Uuid> = appointments.iter().map(|a| a.student_id).collect();
        student_ids.sort();
        student_ids.dedup();

        let profiles: HashMap<Uuid, UserProfile> = self
            .store
            .profiles(student_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(appointments
            .into_iter()
            .map(|a| {
                let student = profiles.get(&a.student_id);
                AppointmentView::new(a, student)
            })
            .collect())
    }
}

fn validate_purpose(purpose: &str) -> SchedulingResult<String> {
    let purpose = purpose.trim();
    if purpose.is_empty() {
        return Err(SchedulingError::Validation(
            "Purpose must not be empty".to_string(),
        ));
    }
    if purpose.chars().count() > MAX_PURPOSE_LEN {
        return Err(SchedulingError::Validation(format!(
            "Purpose must be at most {} characters",
            MAX_PURPOSE_LEN
        )));
    }
    Ok(purpose.to_string())
}
