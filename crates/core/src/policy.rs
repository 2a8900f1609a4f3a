//! # Scheduling Policy
//!
//! Computes the teacher's appointment queue from the current appointment set.
//!
//! ## Ordering
//!
//! After filtering by status and search term, appointments are split into
//! three buckets which are concatenated in this order:
//!
//! 1. **Pending** requests, newest `created_at` first
//! 2. **Upcoming** approved sessions (`date_time > now`), soonest first
//! 3. **Everything else** (completed, canceled, elapsed approved), most
//!    recent `date_time` first
//!
//! Ties inside a bucket fall back to the appointment id so the result is a
//! pure function of its inputs.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::models::appointment::{AppointmentStatus, AppointmentView, StatusFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bucket {
    Pending,
    Upcoming,
    Other,
}

impl Bucket {
    pub fn of(view: &AppointmentView, now: DateTime<Utc>) -> Self {
        let appointment = &view.appointment;
        if appointment.status == AppointmentStatus::Pending {
            Bucket::Pending
        } else if appointment.is_upcoming(now) {
            Bucket::Upcoming
        } else {
            Bucket::Other
        }
    }
}

/// Case-insensitive substring match against student name, student email
/// and purpose. An empty (or blank) term matches everything.
pub fn matches_search(view: &AppointmentView, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    [
        view.student_name.as_str(),
        view.student_email.as_str(),
        view.appointment.purpose.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn compare_within(bucket: Bucket, a: &AppointmentView, b: &AppointmentView) -> Ordering {
    let (a, b) = (&a.appointment, &b.appointment);
    let primary = match bucket {
        Bucket::Pending => b.created_at.cmp(&a.created_at),
        Bucket::Upcoming => a.date_time.cmp(&b.date_time),
        Bucket::Other => b.date_time.cmp(&a.date_time),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Filters, searches and orders appointments for the teacher dashboard.
///
/// Holds no state; call it again whenever the appointment set or the clock
/// moves.
pub fn rank<I>(
    appointments: I,
    filter: StatusFilter,
    search: &str,
    now: DateTime<Utc>,
) -> Vec<AppointmentView>
where
    I: IntoIterator<Item = AppointmentView>,
{
    let mut keyed: Vec<(Bucket, AppointmentView)> = appointments
        .into_iter()
        .filter(|view| filter.matches(view.appointment.status))
        .filter(|view| matches_search(view, search))
        .map(|view| (Bucket::of(&view, now), view))
        .collect();

    keyed.sort_by(|(bucket_a, a), (bucket_b, b)| {
        bucket_a
            .cmp(bucket_b)
            .then_with(|| compare_within(*bucket_a, a, b))
    });

    keyed.into_iter().map(|(_, view)| view).collect()
}
