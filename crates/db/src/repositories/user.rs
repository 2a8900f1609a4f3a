use crate::models::DbUser;
use chrono::Utc;
use eyre::Result;
use officehours_core::models::identity::UserProfile;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn upsert_user(pool: &Pool<Postgres>, profile: &UserProfile) -> Result<UserProfile> {
    let now = Utc::now();

    let user = sqlx::query_as::<_, DbUser>(
        r#"
        INSERT INTO users (id, kind, name, email, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id)
        DO UPDATE SET kind = $2, name = $3, email = $4, updated_at = $5
        RETURNING id, kind, name, email
        "#,
    )
    .bind(profile.id)
    .bind(profile.kind.as_str())
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(now)
    .fetch_one(pool)
    .await?;

    user.try_into()
}

pub async fn get_users_by_ids(pool: &Pool<Postgres>, ids: &[Uuid]) -> Result<Vec<UserProfile>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let users = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, kind, name, email
        FROM users
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    users.into_iter().map(UserProfile::try_from).collect()
}
