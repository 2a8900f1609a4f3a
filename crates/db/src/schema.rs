use eyre::Result;
use sqlx::{Executor, Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create users table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            kind VARCHAR(16) NOT NULL CHECK (kind IN ('teacher', 'student')),
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create availability_slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_slots (
            teacher_id UUID NOT NULL,
            starts_at TIMESTAMP WITH TIME ZONE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            PRIMARY KEY (teacher_id, starts_at)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create appointments table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id UUID PRIMARY KEY,
            teacher_id UUID NOT NULL,
            student_id UUID NOT NULL,
            date_time TIMESTAMP WITH TIME ZONE NOT NULL,
            purpose TEXT NOT NULL,
            status VARCHAR(16) NOT NULL
                CHECK (status IN ('pending', 'approved', 'canceled', 'completed')),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL,
            auto_updated BOOLEAN NOT NULL DEFAULT FALSE,
            auto_updated_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // A live appointment owns its timestamp; no second booking may land on it.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_live_slot
            ON appointments(teacher_id, date_time)
            WHERE status IN ('pending', 'approved');
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes (several statements, so this goes through the simple query protocol)
    pool.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_availability_slots_starts_at ON availability_slots(starts_at);
        CREATE INDEX IF NOT EXISTS idx_appointments_teacher_id ON appointments(teacher_id);
        CREATE INDEX IF NOT EXISTS idx_appointments_student_id ON appointments(student_id);
        CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);
        "#,
    )
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
