use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use officehours_core::models::{
    appointment::{Appointment, AppointmentStatus, NewAppointment, StatusChange},
    identity::UserProfile,
    slot::Slot,
};
use uuid::Uuid;

use crate::store::{SchedulingStore, SlotInsert};

// Mock store for failure-path testing
mock! {
    pub Store {}

    #[async_trait]
    impl SchedulingStore for Store {
        async fn insert_slot(
            &self,
            teacher_id: Uuid,
            starts_at: DateTime<Utc>,
            created_at: DateTime<Utc>,
        ) -> eyre::Result<SlotInsert>;

        async fn open_slots(
            &self,
            teacher_id: Uuid,
            now: DateTime<Utc>,
        ) -> eyre::Result<Vec<Slot>>;

        async fn delete_slot(
            &self,
            teacher_id: Uuid,
            starts_at: DateTime<Utc>,
            now: DateTime<Utc>,
        ) -> eyre::Result<bool>;

        async fn book_slot(
            &self,
            booking: NewAppointment,
            now: DateTime<Utc>,
        ) -> eyre::Result<Option<Appointment>>;

        async fn appointment(&self, id: Uuid) -> eyre::Result<Option<Appointment>>;

        async fn teacher_appointments(&self, teacher_id: Uuid) -> eyre::Result<Vec<Appointment>>;

        async fn student_appointments(&self, student_id: Uuid) -> eyre::Result<Vec<Appointment>>;

        async fn compare_and_set_status(
            &self,
            id: Uuid,
            expected: AppointmentStatus,
            change: StatusChange,
        ) -> eyre::Result<Option<Appointment>>;

        async fn upsert_profile(&self, profile: UserProfile) -> eyre::Result<UserProfile>;

        async fn profiles(&self, ids: Vec<Uuid>) -> eyre::Result<Vec<UserProfile>>;
    }
}
