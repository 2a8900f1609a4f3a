use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use officehours_core::models::appointment::{
    Appointment, AppointmentQuery, AppointmentView, BookAppointmentRequest, StatusFilter,
    TransitionRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{error_handling::AppError, identity::Caller},
    ApiState,
};

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let appointment = state
        .appointments
        .book(&caller, payload.teacher_id, payload.starts_at, &payload.purpose)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Teacher queue: `GET /api/appointments?status=pending&search=sarah`
///
/// `status` defaults to `all`; `search` matches student name, email or
/// purpose, case-insensitively.
#[axum::debug_handler]
pub async fn query_appointments(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let filter: StatusFilter = query.status.as_deref().unwrap_or("all").parse()?;
    let search = query.search.unwrap_or_default();

    let views = state.appointments.query(&caller, filter, &search).await?;
    Ok(Json(views))
}

#[axum::debug_handler]
pub async fn my_appointments(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = state.appointments.student_appointments(&caller).await?;
    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.appointments.get(id, &caller).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn transition_appointment(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state
        .appointments
        .transition(id, &caller, payload.status)
        .await?;
    Ok(Json(appointment))
}
