//! # Scheduling Store
//!
//! The storage seam of the scheduling engine. Every mutating method is a
//! single atomic primitive: callers never hold a lock across two calls, and
//! concurrent writers are resolved by the primitive itself (unique keys for
//! slots, a guarded delete for bookings, and a compare-and-set on the status
//! column for transitions).
//!
//! Domain outcomes such as "duplicate" or "lost the race" are part of the
//! return value; the `eyre::Result` error channel is reserved for storage
//! failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use officehours_core::models::{
    appointment::{Appointment, AppointmentStatus, NewAppointment, StatusChange},
    identity::UserProfile,
    slot::Slot,
};
use uuid::Uuid;

use crate::repositories;
use crate::DbPool;

/// Outcome of publishing a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotInsert {
    Inserted(Slot),
    /// The teacher already has an open slot at this timestamp.
    Duplicate,
    /// A pending or approved appointment already occupies this timestamp.
    AlreadyBooked,
}

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn insert_slot(
        &self,
        teacher_id: Uuid,
        starts_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<SlotInsert>;

    /// Slots strictly after `now`, ascending.
    async fn open_slots(&self, teacher_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Slot>>;

    /// Removes an open slot. Returns `false` if there was none.
    async fn delete_slot(
        &self,
        teacher_id: Uuid,
        starts_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Removes the slot at `booking.date_time` and creates the appointment,
    /// or does neither. Returns `None` if the slot was not open.
    async fn book_slot(
        &self,
        booking: NewAppointment,
        now: DateTime<Utc>,
    ) -> Result<Option<Appointment>>;

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>>;

    async fn teacher_appointments(&self, teacher_id: Uuid) -> Result<Vec<Appointment>>;

    async fn student_appointments(&self, student_id: Uuid) -> Result<Vec<Appointment>>;

    /// Applies `change` only if the stored status equals `expected`.
    /// Returns `None` if the appointment is missing or its status moved.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        change: StatusChange,
    ) -> Result<Option<Appointment>>;

    async fn upsert_profile(&self, profile: UserProfile) -> Result<UserProfile>;

    async fn profiles(&self, ids: Vec<Uuid>) -> Result<Vec<UserProfile>>;
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl SchedulingStore for PgStore {
    async fn insert_slot(
        &self,
        teacher_id: Uuid,
        starts_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<SlotInsert> {
        repositories::slot::create_slot(&self.pool, teacher_id, starts_at, created_at).await
    }

    async fn open_slots(&self, teacher_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Slot>> {
        let rows =
            repositories::slot::get_open_slots_by_teacher_id(&self.pool, teacher_id, now).await?;
        Ok(rows.into_iter().map(Slot::from).collect())
    }

    async fn delete_slot(
        &self,
        teacher_id: Uuid,
        starts_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        repositories::slot::delete_open_slot(&self.pool, teacher_id, starts_at, now).await
    }

    async fn book_slot(
        &self,
        booking: NewAppointment,
        now: DateTime<Utc>,
    ) -> Result<Option<Appointment>> {
        repositories::appointment::book_slot(&self.pool, &booking, now).await
    }

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        repositories::appointment::get_appointment_by_id(&self.pool, id).await
    }

    async fn teacher_appointments(&self, teacher_id: Uuid) -> Result<Vec<Appointment>> {
        repositories::appointment::get_appointments_by_teacher_id(&self.pool, teacher_id).await
    }

    async fn student_appointments(&self, student_id: Uuid) -> Result<Vec<Appointment>> {
        repositories::appointment::get_appointments_by_student_id(&self.pool, student_id).await
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        change: StatusChange,
    ) -> Result<Option<Appointment>> {
        repositories::appointment::compare_and_set_status(&self.pool, id, expected, change).await
    }

    async fn upsert_profile(&self, profile: UserProfile) -> Result<UserProfile> {
        repositories::user::upsert_user(&self.pool, &profile).await
    }

    async fn profiles(&self, ids: Vec<Uuid>) -> Result<Vec<UserProfile>> {
        repositories::user::get_users_by_ids(&self.pool, &ids).await
    }
}
