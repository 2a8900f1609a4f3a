use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/availability",
            post(handlers::availability::add_availability),
        )
        .route(
            "/api/availability/:starts_at",
            delete(handlers::availability::remove_availability),
        )
        .route(
            "/api/teachers/:teacher_id/availability",
            get(handlers::availability::list_availability),
        )
}
