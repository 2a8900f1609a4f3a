//! Fire-and-forget notification hand-off.
//!
//! Successful bookings and transitions are published on a
//! [`tokio::sync::broadcast`] channel. Publishing never fails the operation
//! that triggered it; with no subscriber the event is dropped.

use chrono::{DateTime, Utc};
use officehours_core::models::appointment::{Appointment, AppointmentStatus};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppointmentEvent {
    Booked {
        appointment: Appointment,
    },
    StatusChanged {
        appointment: Appointment,
        from: AppointmentStatus,
        to: AppointmentStatus,
        automatic: bool,
        at: DateTime<Utc>,
    },
}

impl AppointmentEvent {
    pub fn appointment(&self) -> &Appointment {
        match self {
            AppointmentEvent::Booked { appointment } => appointment,
            AppointmentEvent::StatusChanged { appointment, .. } => appointment,
        }
    }

    pub fn appointment_id(&self) -> Uuid {
        self.appointment().id
    }
}

#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<AppointmentEvent>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: AppointmentEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppointmentEvent> {
        self.sender.subscribe()
    }
}

/// Drains the bus and hands each event to the log until the bus is dropped.
pub fn spawn_dispatcher(mut receiver: broadcast::Receiver<AppointmentEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(AppointmentEvent::Booked { appointment }) => info!(
                    appointment_id = %appointment.id,
                    teacher_id = %appointment.teacher_id,
                    student_id = %appointment.student_id,
                    "notify: appointment requested"
                ),
                Ok(AppointmentEvent::StatusChanged {
                    appointment,
                    from,
                    to,
                    automatic,
                    ..
                }) => info!(
                    appointment_id = %appointment.id,
                    student_id = %appointment.student_id,
                    %from,
                    %to,
                    automatic,
                    "notify: appointment status changed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification dispatcher lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
