use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use pretty_assertions::assert_eq;
use rstest::rstest;
use officehours_core::models::appointment::{Appointment, AppointmentStatus};
use officehours_core::stats::{compute_stats, percent_change};
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 14, 15, 0, 0).unwrap()
}

fn appointment(
    student_id: Uuid,
    status: AppointmentStatus,
    date_time: DateTime<Utc>,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        teacher_id: Uuid::nil(),
        student_id,
        date_time,
        purpose: "Consultation".to_string(),
        status,
        created_at: date_time - Duration::days(1),
        auto_updated: false,
        auto_updated_at: None,
    }
}

#[test]
fn test_empty_set_yields_zeroes() {
    let stats = compute_stats(&[], now(), Tz::UTC);

    assert_eq!(stats.total_appointments, 0);
    assert_eq!(stats.pending_requests, 0);
    assert_eq!(stats.total_students, 0);
    assert_eq!(stats.weekly_change, 0.0);
}

#[test]
fn test_weekly_change_is_zero_without_previous_week() {
    let student = Uuid::new_v4();
    let appointments = vec![
        appointment(student, AppointmentStatus::Completed, now() - Duration::days(2)),
        appointment(student, AppointmentStatus::Completed, now() - Duration::days(3)),
    ];

    let stats = compute_stats(&appointments, now(), Tz::UTC);

    assert_eq!(stats.weekly_change, 0.0);
}

#[test]
fn test_weekly_change_compares_trailing_windows() {
    let student = Uuid::new_v4();
    let mut appointments = Vec::new();
    for days in [1, 2, 3] {
        appointments.push(appointment(
            student,
            AppointmentStatus::Completed,
            now() - Duration::days(days),
        ));
    }
    for days in [8, 9] {
        appointments.push(appointment(
            student,
            AppointmentStatus::Completed,
            now() - Duration::days(days),
        ));
    }
    // Outside both windows.
    appointments.push(appointment(
        student,
        AppointmentStatus::Completed,
        now() - Duration::days(20),
    ));

    let stats = compute_stats(&appointments, now(), Tz::UTC);

    assert_eq!(stats.weekly_change, 50.0);
}

#[rstest]
#[case(3, 2, 50.0)]
#[case(1, 4, -75.0)]
#[case(2, 3, -33.3)]
#[case(5, 0, 0.0)]
#[case(0, 0, 0.0)]
fn test_percent_change(#[case] current: usize, #[case] previous: usize, #[case] expected: f64) {
    assert_eq!(percent_change(current, previous), expected);
}

#[test]
fn test_counts_and_distinct_students() {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();
    let appointments = vec![
        appointment(alice, AppointmentStatus::Pending, now() + Duration::days(1)),
        appointment(alice, AppointmentStatus::Approved, now() + Duration::days(2)),
        appointment(bob, AppointmentStatus::Pending, now() + Duration::days(3)),
        // Canceled-only students are not counted.
        appointment(carol, AppointmentStatus::Canceled, now() + Duration::days(1)),
    ];

    let stats = compute_stats(&appointments, now(), Tz::UTC);

    assert_eq!(stats.total_appointments, 4);
    assert_eq!(stats.pending_requests, 2);
    assert_eq!(stats.total_students, 2);
}

#[test]
fn test_approved_today_and_yesterday() {
    let student = Uuid::new_v4();
    let today_morning = Utc.with_ymd_and_hms(2024, 5, 14, 8, 0, 0).unwrap();
    let today_evening = Utc.with_ymd_and_hms(2024, 5, 14, 22, 0, 0).unwrap();
    let yesterday = Utc.with_ymd_and_hms(2024, 5, 13, 10, 0, 0).unwrap();
    let appointments = vec![
        appointment(student, AppointmentStatus::Approved, today_morning),
        appointment(student, AppointmentStatus::Approved, today_evening),
        appointment(student, AppointmentStatus::Approved, yesterday),
        // Completed sessions today do not count as approved.
        appointment(student, AppointmentStatus::Completed, today_morning),
    ];

    let stats = compute_stats(&appointments, now(), Tz::UTC);

    assert_eq!(stats.approved_today, 2);
    assert_eq!(stats.approved_yesterday, 1);
    assert_eq!(stats.approved_delta, 1);
}

#[test]
fn test_calendar_day_follows_timezone() {
    let student = Uuid::new_v4();
    // 03:00 UTC on the 14th is still the 13th in New York.
    let early_utc = Utc.with_ymd_and_hms(2024, 5, 14, 3, 0, 0).unwrap();
    let appointments = vec![appointment(student, AppointmentStatus::Approved, early_utc)];

    let utc = compute_stats(&appointments, now(), Tz::UTC);
    let new_york = compute_stats(&appointments, now(), chrono_tz::America::New_York);

    assert_eq!((utc.approved_today, utc.approved_yesterday), (1, 0));
    assert_eq!((new_york.approved_today, new_york.approved_yesterday), (0, 1));
    assert_eq!(new_york.approved_delta, -1);
}
