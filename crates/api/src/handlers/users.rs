use axum::{extract::State, Json};
use officehours_core::models::identity::{UpsertProfileRequest, UserProfile};
use std::sync::Arc;

use crate::{
    middleware::{error_handling::AppError, identity::Caller},
    ApiState,
};

#[axum::debug_handler]
pub async fn upsert_me(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
    Json(payload): Json<UpsertProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.profiles.upsert(&caller, payload).await?;
    Ok(Json(profile))
}
