use crate::models::{into_appointments, DbAppointment};
use chrono::{DateTime, Utc};
use eyre::Result;
use officehours_core::models::appointment::{
    Appointment, AppointmentStatus, NewAppointment, StatusChange,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const APPOINTMENT_COLUMNS: &str = "id, teacher_id, student_id, date_time, purpose, status, \
     created_at, auto_updated, auto_updated_at";

/// Consumes an open slot and creates the pending appointment in one
/// transaction. Returns `None` when the slot is not open.
pub async fn book_slot(
    pool: &Pool<Postgres>,
    booking: &NewAppointment,
    now: DateTime<Utc>,
) -> Result<Option<Appointment>> {
    let mut tx = pool.begin().await?;

    // The row lock taken here serializes competing bookings of the same slot.
    let removed = sqlx::query(
        r#"
        DELETE FROM availability_slots
        WHERE teacher_id = $1 AND starts_at = $2 AND starts_at > $3
        "#,
    )
    .bind(booking.teacher_id)
    .bind(booking.date_time)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if removed == 0 {
        tx.rollback().await?;
        tracing::debug!(
            "Slot not open for booking: teacher_id={}, date_time={}",
            booking.teacher_id,
            booking.date_time
        );
        return Ok(None);
    }

    let row = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        INSERT INTO appointments
            (id, teacher_id, student_id, date_time, purpose, status, created_at, auto_updated)
        VALUES ($1, $2, $3, $4, $5, 'pending', $6, FALSE)
        ON CONFLICT (teacher_id, date_time) WHERE status IN ('pending', 'approved') DO NOTHING
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(booking.id)
    .bind(booking.teacher_id)
    .bind(booking.student_id)
    .bind(booking.date_time)
    .bind(&booking.purpose)
    .bind(booking.created_at)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Ok(None);
    };

    tx.commit().await?;
    tracing::debug!("Appointment booked: id={}", row.id);
    Ok(Some(row.try_into()?))
}

pub async fn get_appointment_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<Appointment>> {
    let row = sqlx::query_as::<_, DbAppointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Appointment::try_from).transpose()
}

pub async fn get_appointments_by_teacher_id(
    pool: &Pool<Postgres>,
    teacher_id: Uuid,
) -> Result<Vec<Appointment>> {
    let rows = sqlx::query_as::<_, DbAppointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE teacher_id = $1 ORDER BY date_time ASC"
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;

    into_appointments(rows)
}

pub async fn get_appointments_by_student_id(
    pool: &Pool<Postgres>,
    student_id: Uuid,
) -> Result<Vec<Appointment>> {
    let rows = sqlx::query_as::<_, DbAppointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE student_id = $1 ORDER BY date_time ASC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    into_appointments(rows)
}

/// Writes `change` only if the stored status still equals `expected`.
/// Returns `None` when another writer got there first.
pub async fn compare_and_set_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    expected: AppointmentStatus,
    change: StatusChange,
) -> Result<Option<Appointment>> {
    let row = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        UPDATE appointments
        SET status = $3, auto_updated = $4, auto_updated_at = $5
        WHERE id = $1 AND status = $2
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(expected.as_str())
    .bind(change.status.as_str())
    .bind(change.auto_updated)
    .bind(change.auto_updated_at)
    .fetch_optional(pool)
    .await?;

    if row.is_none() {
        tracing::debug!("Status compare-and-set missed: id={}, expected={}", id, expected);
    }

    row.map(Appointment::try_from).transpose()
}
