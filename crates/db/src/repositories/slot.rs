use crate::models::DbSlot;
use crate::store::SlotInsert;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_slot(
    pool: &Pool<Postgres>,
    teacher_id: Uuid,
    starts_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> Result<SlotInsert> {
    tracing::debug!("Creating slot: teacher_id={}, starts_at={}", teacher_id, starts_at);

    let mut tx = pool.begin().await?;

    let booked = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM appointments
            WHERE teacher_id = $1 AND date_time = $2 AND status IN ('pending', 'approved')
        );
        "#,
    )
    .bind(teacher_id)
    .bind(starts_at)
    .fetch_one(&mut *tx)
    .await?;

    if booked {
        tx.rollback().await?;
        tracing::debug!("Slot already backs a live appointment: teacher_id={}", teacher_id);
        return Ok(SlotInsert::AlreadyBooked);
    }

    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        INSERT INTO availability_slots (teacher_id, starts_at, created_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (teacher_id, starts_at) DO NOTHING
        RETURNING teacher_id, starts_at, created_at
        "#,
    )
    .bind(teacher_id)
    .bind(starts_at)
    .bind(created_at)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(match slot {
        Some(row) => SlotInsert::Inserted(row.into()),
        None => SlotInsert::Duplicate,
    })
}

pub async fn get_open_slots_by_teacher_id(
    pool: &Pool<Postgres>,
    teacher_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT teacher_id, starts_at, created_at
        FROM availability_slots
        WHERE teacher_id = $1 AND starts_at > $2
        ORDER BY starts_at ASC
        "#,
    )
    .bind(teacher_id)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

pub async fn delete_open_slot(
    pool: &Pool<Postgres>,
    teacher_id: Uuid,
    starts_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM availability_slots
        WHERE teacher_id = $1 AND starts_at = $2 AND starts_at > $3
        "#,
    )
    .bind(teacher_id)
    .bind(starts_at)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
