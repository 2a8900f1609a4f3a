//! # Availability
//!
//! Teachers publish future timestamps; students book against them. Expiry
//! is lazy: a slot whose start is at or before "now" is simply never
//! returned, and nothing sweeps the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use officehours_core::{
    clock::Clock,
    errors::{SchedulingError, SchedulingResult},
    models::{
        identity::Identity,
        slot::{normalize_timestamp, Slot},
    },
};
use officehours_db::{SchedulingStore, SlotInsert};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Publishes a slot for the calling teacher.
    ///
    /// # Errors
    ///
    /// * `Forbidden` - caller is not a teacher
    /// * `Validation` - timestamp is not in the future, is already an open
    ///   slot, or is already taken by a live appointment
    pub async fn add_slot(
        &self,
        caller: &Identity,
        starts_at: DateTime<Utc>,
    ) -> SchedulingResult<Slot> {
        let teacher_id = caller.require_teacher()?;
        let now = self.clock.now();
        let starts_at = normalize_timestamp(starts_at);

        if starts_at <= now {
            return Err(SchedulingError::Validation(format!(
                "Slot {} must be in the future",
                starts_at
            )));
        }

        match self.store.insert_slot(teacher_id, starts_at, now).await? {
            SlotInsert::Inserted(slot) => {
                info!(%teacher_id, %starts_at, "slot published");
                Ok(slot)
            }
            SlotInsert::Duplicate => Err(SchedulingError::Validation(format!(
                "Slot {} already exists",
                starts_at
            ))),
            SlotInsert::AlreadyBooked => Err(SchedulingError::Validation(format!(
                "Slot {} is already booked",
                starts_at
            ))),
        }
    }

    /// Open slots of a teacher, soonest first.
    pub async fn list_slots(&self, teacher_id: Uuid) -> SchedulingResult<Vec<DateTime<Utc>>> {
        let now = self.clock.now();
        let slots = self.store.open_slots(teacher_id, now).await?;
        Ok(slots
            .into_iter()
            .filter(|slot| slot.is_open_at(now))
            .map(|slot| slot.starts_at)
            .collect())
    }

    /// Removes one of the calling teacher's open slots.
    ///
    /// A slot that has been booked no longer exists, so it cannot be removed
    /// here; the appointment has to be canceled instead.
    pub async fn delete_slot(
        &self,
        caller: &Identity,
        starts_at: DateTime<Utc>,
    ) -> SchedulingResult<()> {
        let teacher_id = caller.require_teacher()?;
        let now = self.clock.now();
        let starts_at = normalize_timestamp(starts_at);

        if self.store.delete_slot(teacher_id, starts_at, now).await? {
            info!(%teacher_id, %starts_at, "slot removed");
            Ok(())
        } else {
            warn!(%teacher_id, %starts_at, "slot removal for unknown slot");
            Err(SchedulingError::NotFound(format!(
                "No open slot at {}",
                starts_at
            )))
        }
    }
}
