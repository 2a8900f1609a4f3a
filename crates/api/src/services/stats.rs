use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use officehours_core::{
    errors::SchedulingResult,
    models::{identity::Identity, stats::StatsSnapshot},
    stats::compute_stats,
};

use super::appointments::AppointmentService;

/// Dashboard counters, recomputed on every call.
#[derive(Clone)]
pub struct StatsService {
    appointments: Arc<AppointmentService>,
    timezone: Tz,
}

impl StatsService {
    pub fn new(appointments: Arc<AppointmentService>, timezone: Tz) -> Self {
        Self {
            appointments,
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub async fn compute_stats(
        &self,
        caller: &Identity,
        now: DateTime<Utc>,
    ) -> SchedulingResult<StatsSnapshot> {
        let teacher_id = caller.require_teacher()?;
        let appointments = self.appointments.teacher_appointments(teacher_id, now).await?;
        Ok(compute_stats(&appointments, now, self.timezone))
    }
}
