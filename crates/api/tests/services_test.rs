
use chrono::Duration;
use officehours_api::{config::SchedulingSettings, services::AppointmentEvent};
use officehours_core::{
    errors::SchedulingError,
    models::{
        appointment::{AppointmentStatus, StatusFilter},
        identity::{Identity, UpsertProfileRequest, UserKind},
    },
};
use officehours_db::SchedulingStore;
use pretty_assertions::assert_eq;
use rstest::rstest;
use test_log::test;
use uuid::Uuid;

use crate::test_utils::{appointment, TestContext};

// Availability

#[test(tokio::test)]
async fn test_add_slot_lists_future_slots_in_order() {
    let ctx = TestContext::new();
    let later = ctx.open_slot(5).await;
    let sooner = ctx.open_slot(2).await;

    let slots = ctx.state.availability.list_slots(ctx.teacher.id).await.unwrap();
    assert_eq!(slots, vec![sooner, later]);
}

#[test(tokio::test)]
async fn test_add_slot_rejects_past_and_present_timestamps() {
    let ctx = TestContext::new();

    for at in [ctx.now() - Duration::minutes(1), ctx.now()] {
        let err = ctx
            .state
            .availability
            .add_slot(&ctx.teacher, at)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::Validation(_)));
    }
}

#[test(tokio::test)]
async fn test_add_slot_rejects_duplicate_timestamp() {
    let ctx = TestContext::new();
    let at = ctx.open_slot(3).await;

    let err = ctx
        .state
        .availability
        .add_slot(&ctx.teacher, at)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));
    assert_eq!(ctx.store.stored_slot_count(ctx.teacher.id).await, 1);
}

#[test(tokio::test)]
async fn test_slot_timestamps_resolve_to_microseconds() {
    let ctx = TestContext::new();
    let base = ctx.now() + Duration::hours(2);

    let slot = ctx
        .state
        .availability
        .add_slot(&ctx.teacher, base + Duration::nanoseconds(400))
        .await
        .unwrap();
    assert_eq!(slot.starts_at, base);

    let err = ctx
        .state
        .availability
        .add_slot(&ctx.teacher, base + Duration::nanoseconds(900))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));
    assert_eq!(ctx.store.stored_slot_count(ctx.teacher.id).await, 1);

    let booked = ctx
        .state
        .appointments
        .book(&ctx.student, ctx.teacher.id, base + Duration::nanoseconds(700), "Precision")
        .await
        .unwrap();
    assert_eq!(booked.date_time, base);
}

#[test(tokio::test)]
async fn test_delete_slot_ignores_sub_microsecond_digits() {
    let ctx = TestContext::new();
    let at = ctx.open_slot(2).await;

    ctx.state
        .availability
        .delete_slot(&ctx.teacher, at + Duration::nanoseconds(250))
        .await
        .unwrap();
    assert_eq!(ctx.store.stored_slot_count(ctx.teacher.id).await, 0);
}

#[test(tokio::test)]
async fn test_add_slot_requires_teacher() {
    let ctx = TestContext::new();
    let at = ctx.now() + Duration::hours(1);

    let err = ctx
        .state
        .availability
        .add_slot(&ctx.student, at)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Forbidden(_)));
}

#[test(tokio::test)]
async fn test_elapsed_slots_disappear_from_listing() {
    let ctx = TestContext::new();
    ctx.open_slot(1).await;
    let kept = ctx.open_slot(4).await;

    ctx.clock.advance(Duration::hours(2));

    let slots = ctx.state.availability.list_slots(ctx.teacher.id).await.unwrap();
    assert_eq!(slots, vec![kept]);
}

#[test(tokio::test)]
async fn test_delete_slot() {
    let ctx = TestContext::new();
    let at = ctx.open_slot(2).await;

    ctx.state
        .availability
        .delete_slot(&ctx.teacher, at)
        .await
        .unwrap();
    assert!(ctx
        .state
        .availability
        .list_slots(ctx.teacher.id)
        .await
        .unwrap()
        .is_empty());

    let err = ctx
        .state
        .availability
        .delete_slot(&ctx.teacher, at)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::NotFound(_)));
}

#[test(tokio::test)]
async fn test_delete_booked_slot_is_not_found() {
    let ctx = TestContext::new();
    let booked = ctx.booked(2, "Thesis review").await;

    let err = ctx
        .state
        .availability
        .delete_slot(&ctx.teacher, booked.date_time)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::NotFound(_)));
}

// Booking

#[test(tokio::test)]
async fn test_book_creates_pending_appointment_and_consumes_slot() {
    let ctx = TestContext::new();
    let at = ctx.open_slot(2).await;

    let booked = ctx
        .state
        .appointments
        .book(&ctx.student, ctx.teacher.id, at, "  Essay feedback  ")
        .await
        .unwrap();

    assert_eq!(booked.status, AppointmentStatus::Pending);
    assert_eq!(booked.date_time, at);
    assert_eq!(booked.student_id, ctx.student.id);
    assert_eq!(booked.purpose, "Essay feedback");
    assert_eq!(booked.created_at, ctx.now());
    assert!(!booked.auto_updated);
    assert!(ctx
        .state
        .availability
        .list_slots(ctx.teacher.id)
        .await
        .unwrap()
        .is_empty());
}

#[test(tokio::test)]
async fn test_book_taken_slot_is_unavailable_and_writes_nothing() {
    let ctx = TestContext::new();
    let booked = ctx.booked(2, "First").await;
    let other = Identity::student(Uuid::new_v4());

    let err = ctx
        .state
        .appointments
        .book(&other, ctx.teacher.id, booked.date_time, "Second")
        .await
        .unwrap_err();

    assert!(matches!(err, SchedulingError::SlotUnavailable(_)));
    assert_eq!(ctx.store.appointment_count().await, 1);
}

#[test(tokio::test)]
async fn test_book_unpublished_or_elapsed_slot_is_unavailable() {
    let ctx = TestContext::new();
    let never_published = ctx.now() + Duration::hours(6);
    let elapsed = ctx.open_slot(1).await;
    ctx.clock.advance(Duration::hours(1));

    for at in [never_published, elapsed] {
        let err = ctx
            .state
            .appointments
            .book(&ctx.student, ctx.teacher.id, at, "Questions")
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::SlotUnavailable(_)));
    }
    assert_eq!(ctx.store.appointment_count().await, 0);
}

#[rstest]
#[case::blank("   ".to_string())]
#[case::too_long("x".repeat(501))]
#[tokio::test]
async fn test_book_validates_purpose(#[case] purpose: String) {
    let ctx = TestContext::new();
    let at = ctx.open_slot(2).await;

    let err = ctx
        .state
        .appointments
        .book(&ctx.student, ctx.teacher.id, at, &purpose)
        .await
        .unwrap_err();

    assert!(matches!(err, SchedulingError::Validation(_)));
    assert_eq!(ctx.store.stored_slot_count(ctx.teacher.id).await, 1);
}

#[test(tokio::test)]
async fn test_book_requires_student() {
    let ctx = TestContext::new();
    let at = ctx.open_slot(2).await;

    let err = ctx
        .state
        .appointments
        .book(&ctx.teacher, ctx.teacher.id, at, "Self booking")
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Forbidden(_)));
}

#[test(tokio::test)]
async fn test_book_publishes_event() {
    let ctx = TestContext::new();
    let mut events = ctx.state.notifications.subscribe();

    let booked = ctx.booked(2, "Lab report").await;

    match events.recv().await.unwrap() {
        AppointmentEvent::Booked { appointment } => assert_eq!(appointment.id, booked.id),
        other => panic!("unexpected event: {:?}", other),
    }
}

// Lifecycle

#[test(tokio::test)]
async fn test_full_lifecycle_to_completed() {
    let ctx = TestContext::new();
    let booked = ctx.booked(2, "Project check-in").await;

    let approved = ctx
        .state
        .appointments
        .transition(booked.id, &ctx.teacher, AppointmentStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, AppointmentStatus::Approved);

    let completed = ctx
        .state
        .appointments
        .transition(booked.id, &ctx.teacher, AppointmentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert!(!completed.auto_updated);
    assert_eq!(completed.auto_updated_at, None);
}

#[rstest]
#[case(AppointmentStatus::Pending)]
#[case(AppointmentStatus::Approved)]
#[case(AppointmentStatus::Canceled)]
#[tokio::test]
async fn test_completed_appointments_never_change(#[case] target: AppointmentStatus) {
    let ctx = TestContext::new();
    let approved = ctx.approved(2).await;
    ctx.state
        .appointments
        .transition(approved.id, &ctx.teacher, AppointmentStatus::Completed)
        .await
        .unwrap();

    let err = ctx
        .state
        .appointments
        .transition(approved.id, &ctx.teacher, target)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidTransition { .. }));
}

#[test(tokio::test)]
async fn test_canceled_cannot_be_approved() {
    let ctx = TestContext::new();
    let booked = ctx.booked(2, "Cancel me").await;
    ctx.state
        .appointments
        .transition(booked.id, &ctx.teacher, AppointmentStatus::Canceled)
        .await
        .unwrap();

    let err = ctx
        .state
        .appointments
        .transition(booked.id, &ctx.teacher, AppointmentStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::InvalidTransition {
            from: AppointmentStatus::Canceled,
            to: AppointmentStatus::Approved
        }
    ));
}

#[test(tokio::test)]
async fn test_pending_cannot_complete_directly() {
    let ctx = TestContext::new();
    let booked = ctx.booked(2, "Skip ahead").await;

    let err = ctx
        .state
        .appointments
        .transition(booked.id, &ctx.teacher, AppointmentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidTransition { .. }));
}

#[test(tokio::test)]
async fn test_repeated_transition_is_conflict() {
    let ctx = TestContext::new();
    let approved = ctx.approved(2).await;

    let err = ctx
        .state
        .appointments
        .transition(approved.id, &ctx.teacher, AppointmentStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Conflict(_)));
    assert!(err.is_retryable());
}

#[test(tokio::test)]
async fn test_transition_checks_ownership_and_existence() {
    let ctx = TestContext::new();
    let booked = ctx.booked(2, "Ownership").await;
    let stranger = Identity::teacher(Uuid::new_v4());

    let err = ctx
        .state
        .appointments
        .transition(booked.id, &stranger, AppointmentStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Forbidden(_)));

    let err = ctx
        .state
        .appointments
        .transition(booked.id, &ctx.student, AppointmentStatus::Canceled)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Forbidden(_)));

    let err = ctx
        .state
        .appointments
        .transition(Uuid::new_v4(), &ctx.teacher, AppointmentStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::NotFound(_)));

    let unchanged = ctx.state.appointments.get(booked.id, &ctx.teacher).await.unwrap();
    assert_eq!(unchanged.status, AppointmentStatus::Pending);
}

#[test(tokio::test)]
async fn test_get_is_limited_to_participants() {
    let ctx = TestContext::new();
    let booked = ctx.booked(2, "Visibility").await;

    assert_eq!(
        ctx.state.appointments.get(booked.id, &ctx.student).await.unwrap().id,
        booked.id
    );
    let err = ctx
        .state
        .appointments
        .get(booked.id, &Identity::student(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Forbidden(_)));
}

// Auto-completion

#[test(tokio::test)]
async fn test_elapsed_approved_session_auto_completes_on_read() {
    let ctx = TestContext::new();
    let mut events = ctx.state.notifications.subscribe();
    let approved = ctx.approved(1).await;

    // Session ends at +2h with the default 60 minute duration.
    ctx.clock.advance(Duration::minutes(119));
    let still = ctx.state.appointments.get(approved.id, &ctx.teacher).await.unwrap();
    assert_eq!(still.status, AppointmentStatus::Approved);

    ctx.clock.advance(Duration::minutes(1));
    let read_at = ctx.now();
    let done = ctx.state.appointments.get(approved.id, &ctx.student).await.unwrap();
    assert_eq!(done.status, AppointmentStatus::Completed);
    assert!(done.auto_updated);
    assert_eq!(done.auto_updated_at, Some(read_at));

    let automatic: Vec<bool> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            AppointmentEvent::StatusChanged { automatic, .. } => Some(automatic),
            AppointmentEvent::Booked { .. } => None,
        })
        .collect();
    assert_eq!(automatic, vec![false, true]);
}

#[test(tokio::test)]
async fn test_auto_completion_respects_session_duration_setting() {
    let ctx = TestContext::with_settings(SchedulingSettings {
        session_duration: Duration::minutes(30),
        ..SchedulingSettings::default()
    });
    let approved = ctx.approved(1).await;

    ctx.clock.advance(Duration::minutes(90));
    let done = ctx.state.appointments.get(approved.id, &ctx.teacher).await.unwrap();
    assert_eq!(done.status, AppointmentStatus::Completed);
}

#[test(tokio::test)]
async fn test_cancel_after_session_ended_is_invalid() {
    let ctx = TestContext::new();
    let approved = ctx.approved(1).await;
    ctx.clock.advance(Duration::hours(3));

    let err = ctx
        .state
        .appointments
        .transition(approved.id, &ctx.teacher, AppointmentStatus::Canceled)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::InvalidTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Canceled
        }
    ));

    // The rejected cancel still leaves the settled completion behind.
    let stored = ctx.store.appointment(approved.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Completed);
    assert!(stored.auto_updated);
    assert_eq!(stored.auto_updated_at, Some(ctx.now()));
}

#[test(tokio::test)]
async fn test_pending_past_sessions_stay_pending() {
    let ctx = TestContext::new();
    let booked = ctx.booked(1, "Never reviewed").await;
    ctx.clock.advance(Duration::days(2));

    let read = ctx.state.appointments.get(booked.id, &ctx.teacher).await.unwrap();
    assert_eq!(read.status, AppointmentStatus::Pending);
    assert!(!read.auto_updated);
}

// Teacher queue

#[test(tokio::test)]
async fn test_query_orders_buckets_and_attaches_students() {
    let ctx = TestContext::new();
    let now = ctx.now();
    let sarah = ctx.register_student("Sarah Chen", "sarah@example.edu").await;
    let omar = ctx.register_student("Omar Haddad", "omar@example.edu").await;

    let p1 = appointment(
        ctx.teacher.id,
        sarah.id,
        now + Duration::days(3),
        AppointmentStatus::Pending,
        now - Duration::hours(1),
    );
    let a2 = appointment(
        ctx.teacher.id,
        omar.id,
        now + Duration::days(2),
        AppointmentStatus::Approved,
        now - Duration::days(3),
    );
    let a1 = appointment(
        ctx.teacher.id,
        sarah.id,
        now + Duration::days(1),
        AppointmentStatus::Approved,
        now - Duration::days(2),
    );
    let c1 = appointment(
        ctx.teacher.id,
        omar.id,
        now + Duration::days(4),
        AppointmentStatus::Canceled,
        now - Duration::days(1),
    );
    for seeded in [&c1, &a2, &p1, &a1] {
        ctx.store.seed_appointment(seeded.clone()).await;
    }

    let ranked = ctx
        .state
        .appointments
        .query(&ctx.teacher, StatusFilter::All, "")
        .await
        .unwrap();
    let ids: Vec<Uuid> = ranked.iter().map(|v| v.appointment.id).collect();
    assert_eq!(ids, vec![p1.id, a1.id, a2.id, c1.id]);
    assert_eq!(ranked[0].student_name, "Sarah Chen");
    assert_eq!(ranked[1].student_email, "sarah@example.edu");

    let searched = ctx
        .state
        .appointments
        .query(&ctx.teacher, StatusFilter::All, "SARAH")
        .await
        .unwrap();
    let ids: Vec<Uuid> = searched.iter().map(|v| v.appointment.id).collect();
    assert_eq!(ids, vec![p1.id, a1.id]);

    let approved_only = ctx
        .state
        .appointments
        .query(&ctx.teacher, StatusFilter::Only(AppointmentStatus::Approved), "omar")
        .await
        .unwrap();
    let ids: Vec<Uuid> = approved_only.iter().map(|v| v.appointment.id).collect();
    assert_eq!(ids, vec![a2.id]);
}

#[test(tokio::test)]
async fn test_query_is_scoped_to_calling_teacher() {
    let ctx = TestContext::new();
    ctx.booked(2, "Mine").await;

    let other = Identity::teacher(Uuid::new_v4());
    let ranked = ctx
        .state
        .appointments
        .query(&other, StatusFilter::All, "")
        .await
        .unwrap();
    assert!(ranked.is_empty());

    let err = ctx
        .state
        .appointments
        .query(&ctx.student, StatusFilter::All, "")
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Forbidden(_)));
}

#[test(tokio::test)]
async fn test_student_appointments_soonest_first() {
    let ctx = TestContext::new();
    let later = ctx.booked(5, "Later").await;
    let sooner = ctx.booked(2, "Sooner").await;

    let mine = ctx
        .state
        .appointments
        .student_appointments(&ctx.student)
        .await
        .unwrap();
    let ids: Vec<Uuid> = mine.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);
}

// Statistics

#[test(tokio::test)]
async fn test_stats_counts_and_weekly_change() {
    let ctx = TestContext::new();
    let now = ctx.now();
    let teacher = ctx.teacher.id;
    let (s1, s2, s3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let seeded = [
        // this week
        appointment(teacher, s1, now - Duration::days(1), AppointmentStatus::Pending, now),
        appointment(teacher, s2, now - Duration::days(2), AppointmentStatus::Completed, now),
        appointment(teacher, s3, now - Duration::days(3), AppointmentStatus::Canceled, now),
        // previous week
        appointment(teacher, s1, now - Duration::days(8), AppointmentStatus::Completed, now),
        appointment(teacher, s2, now - Duration::days(9), AppointmentStatus::Canceled, now),
        // today, still ahead
        appointment(teacher, s1, now + Duration::hours(3), AppointmentStatus::Approved, now),
    ];
    for a in seeded {
        ctx.store.seed_appointment(a).await;
    }

    let stats = ctx.state.stats.compute_stats(&ctx.teacher, now).await.unwrap();
    assert_eq!(stats.total_appointments, 6);
    assert_eq!(stats.pending_requests, 1);
    assert_eq!(stats.approved_today, 1);
    assert_eq!(stats.approved_yesterday, 0);
    assert_eq!(stats.approved_delta, 1);
    assert_eq!(stats.total_students, 2);
    assert_eq!(stats.weekly_change, 50.0);
}

#[test(tokio::test)]
async fn test_stats_weekly_change_zero_without_previous_week() {
    let ctx = TestContext::new();
    ctx.booked(1, "Fresh").await;
    ctx.clock.advance(Duration::hours(2));

    let stats = ctx
        .state
        .stats
        .compute_stats(&ctx.teacher, ctx.now())
        .await
        .unwrap();
    assert_eq!(stats.total_appointments, 1);
    assert_eq!(stats.weekly_change, 0.0);
}

#[test(tokio::test)]
async fn test_stats_requires_teacher() {
    let ctx = TestContext::new();
    let err = ctx
        .state
        .stats
        .compute_stats(&ctx.student, ctx.now())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Forbidden(_)));
}

// Profiles

#[test(tokio::test)]
async fn test_profile_upsert_uses_caller_identity() {
    let ctx = TestContext::new();

    let profile = ctx
        .state
        .profiles
        .upsert(
            &ctx.student,
            UpsertProfileRequest {
                name: "Priya Nair".to_string(),
                email: "priya@example.edu".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.id, ctx.student.id);
    assert_eq!(profile.kind, UserKind::Student);

    let err = ctx
        .state
        .profiles
        .upsert(
            &ctx.student,
            UpsertProfileRequest {
                name: "Priya Nair".to_string(),
                email: "not-an-email".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));
}
