//! # Availability Handlers
//!
//! Teachers publish and withdraw bookable timestamps; anyone may list a
//! teacher's open slots. Listing never returns a slot whose start is at or
//! before the current time.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use officehours_core::models::slot::{CreateSlotRequest, ListSlotsResponse, SlotResponse};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{error_handling::AppError, identity::Caller},
    ApiState,
};

/// Publishes a slot for the calling teacher
///
/// # Endpoint
///
/// ```text
/// POST /api/availability
/// { "starts_at": "2024-05-14T15:00:00Z" }
/// ```
///
/// # Errors
///
/// * `400` - timestamp in the past or already published
/// * `403` - caller is not a teacher
#[axum::debug_handler]
pub async fn add_availability(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
    Json(payload): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<SlotResponse>), AppError> {
    let slot = state.availability.add_slot(&caller, payload.starts_at).await?;
    Ok((StatusCode::CREATED, Json(slot.into())))
}

#[axum::debug_handler]
pub async fn list_availability(
    State(state): State<Arc<ApiState>>,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<ListSlotsResponse>, AppError> {
    let slots = state.availability.list_slots(teacher_id).await?;
    Ok(Json(ListSlotsResponse { teacher_id, slots }))
}

/// Withdraws one of the calling teacher's open slots
///
/// The timestamp is given in RFC 3339 form, e.g.
/// `DELETE /api/availability/2024-05-14T15:00:00Z`.
#[axum::debug_handler]
pub async fn remove_availability(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
    Path(starts_at): Path<DateTime<Utc>>,
) -> Result<StatusCode, AppError> {
    state.availability.delete_slot(&caller, starts_at).await?;
    Ok(StatusCode::NO_CONTENT)
}
