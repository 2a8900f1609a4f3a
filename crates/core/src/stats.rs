//! Derived dashboard counters.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::stats::StatsSnapshot;

const WEEK_DAYS: i64 = 7;

fn local_day(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

fn count_in_window(
    appointments: &[Appointment],
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> usize {
    appointments
        .iter()
        .filter(|a| a.date_time >= from && a.date_time < until)
        .count()
}

/// Percentage change from `previous` to `current`, one decimal.
pub fn percent_change(current: usize, previous: usize) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    let change = (current as f64 - previous as f64) / previous as f64 * 100.0;
    (change * 10.0).round() / 10.0
}

/// Computes the dashboard counters for one teacher's appointments.
///
/// "Today" and "yesterday" are calendar days in `tz`. The weekly trend
/// compares session volume in `[now - 7d, now)` against the seven days
/// before that.
pub fn compute_stats(appointments: &[Appointment], now: DateTime<Utc>, tz: Tz) -> StatsSnapshot {
    let today = local_day(now, tz);
    let yesterday = today.pred_opt();

    let mut pending_requests = 0;
    let mut approved_today = 0;
    let mut approved_yesterday = 0;
    let mut students = HashSet::new();

    for appointment in appointments {
        match appointment.status {
            AppointmentStatus::Pending => pending_requests += 1,
            AppointmentStatus::Approved => {
                let day = local_day(appointment.date_time, tz);
                if day == today {
                    approved_today += 1;
                } else if Some(day) == yesterday {
                    approved_yesterday += 1;
                }
            }
            _ => {}
        }
        if appointment.status != AppointmentStatus::Canceled {
            students.insert(appointment.student_id);
        }
    }

    let week = Duration::days(WEEK_DAYS);
    let this_week = count_in_window(appointments, now - week, now);
    let last_week = count_in_window(appointments, now - week - week, now - week);

    StatsSnapshot {
        total_appointments: appointments.len(),
        pending_requests,
        approved_today,
        approved_yesterday,
        approved_delta: approved_today as i64 - approved_yesterday as i64,
        total_students: students.len(),
        weekly_change: percent_change(this_week, last_week),
    }
}
