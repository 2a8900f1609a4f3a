use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/appointments",
            get(handlers::appointments::query_appointments)
                .post(handlers::appointments::book_appointment),
        )
        .route(
            "/api/appointments/mine",
            get(handlers::appointments::my_appointments),
        )
        .route(
            "/api/appointments/:id",
            get(handlers::appointments::get_appointment),
        )
        .route(
            "/api/appointments/:id/status",
            put(handlers::appointments::transition_appointment),
        )
}
