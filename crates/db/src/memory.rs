//! In-process [`SchedulingStore`] used by tests and local runs without
//! PostgreSQL.
//!
//! All state sits behind one [`tokio::sync::RwLock`]. Each trait method takes
//! the lock once and releases it before returning, so every method is atomic
//! with respect to the others, matching the guarantees of the SQL store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use officehours_core::models::{
    appointment::{Appointment, AppointmentStatus, NewAppointment, StatusChange},
    identity::UserProfile,
    slot::Slot,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{SchedulingStore, SlotInsert};

#[derive(Debug, Default)]
struct State {
    slots: HashMap<Uuid, BTreeMap<DateTime<Utc>, Slot>>,
    appointments: HashMap<Uuid, Appointment>,
    profiles: HashMap<Uuid, UserProfile>,
}

impl State {
    fn has_live_appointment(&self, teacher_id: Uuid, at: DateTime<Utc>) -> bool {
        self.appointments.values().any(|a| {
            a.teacher_id == teacher_id && a.date_time == at && !a.status.is_terminal()
        })
    }

    fn sorted_appointments<F>(&self, keep: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut found: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|a| keep(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.date_time.cmp(&b.date_time).then(a.id.cmp(&b.id)));
        found
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an appointment as-is, bypassing slot consumption. Intended for
    /// loading history.
    pub async fn seed_appointment(&self, appointment: Appointment) {
        let mut state = self.state.write().await;
        state.appointments.insert(appointment.id, appointment);
    }

    /// Number of stored slots for a teacher, expired ones included.
    pub async fn stored_slot_count(&self, teacher_id: Uuid) -> usize {
        let state = self.state.read().await;
        state.slots.get(&teacher_id).map_or(0, BTreeMap::len)
    }

    pub async fn appointment_count(&self) -> usize {
        self.state.read().await.appointments.len()
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn insert_slot(
        &self,
        teacher_id: Uuid,
        starts_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<SlotInsert> {
        let mut state = self.state.write().await;

        if state.has_live_appointment(teacher_id, starts_at) {
            return Ok(SlotInsert::AlreadyBooked);
        }

        let slots = state.slots.entry(teacher_id).or_default();
        if slots.contains_key(&starts_at) {
            return Ok(SlotInsert::Duplicate);
        }

        let slot = Slot {
            teacher_id,
            starts_at,
            created_at,
        };
        slots.insert(starts_at, slot.clone());
        Ok(SlotInsert::Inserted(slot))
    }

    async fn open_slots(&self, teacher_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Slot>> {
        let state = self.state.read().await;
        Ok(state
            .slots
            .get(&teacher_id)
            .map(|slots| {
                slots
                    .values()
                    .filter(|slot| slot.is_open_at(now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_slot(
        &self,
        teacher_id: Uuid,
        starts_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(slots) = state.slots.get_mut(&teacher_id) else {
            return Ok(false);
        };
        if starts_at <= now {
            return Ok(false);
        }
        Ok(slots.remove(&starts_at).is_some())
    }

    async fn book_slot(
        &self,
        booking: NewAppointment,
        now: DateTime<Utc>,
    ) -> Result<Option<Appointment>> {
        let mut state = self.state.write().await;

        if state.has_live_appointment(booking.teacher_id, booking.date_time) {
            return Ok(None);
        }

        let Some(slots) = state.slots.get_mut(&booking.teacher_id) else {
            return Ok(None);
        };
        let open = slots
            .get(&booking.date_time)
            .is_some_and(|slot| slot.is_open_at(now));
        if !open {
            return Ok(None);
        }
        slots.remove(&booking.date_time);

        let appointment = booking.into_appointment();
        state
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(Some(appointment))
    }

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn teacher_appointments(&self, teacher_id: Uuid) -> Result<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(state.sorted_appointments(|a| a.teacher_id == teacher_id))
    }

    async fn student_appointments(&self, student_id: Uuid) -> Result<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(state.sorted_appointments(|a| a.student_id == student_id))
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        change: StatusChange,
    ) -> Result<Option<Appointment>> {
        let mut state = self.state.write().await;
        match state.appointments.get_mut(&id) {
            Some(appointment) if appointment.status == expected => {
                appointment.status = change.status;
                appointment.auto_updated = change.auto_updated;
                appointment.auto_updated_at = change.auto_updated_at;
                Ok(Some(appointment.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn upsert_profile(&self, profile: UserProfile) -> Result<UserProfile> {
        let mut state = self.state.write().await;
        state.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn profiles(&self, ids: Vec<Uuid>) -> Result<Vec<UserProfile>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }
}
