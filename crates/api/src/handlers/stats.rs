use axum::{extract::State, Json};
use officehours_core::models::stats::StatsSnapshot;
use std::sync::Arc;

use crate::{
    middleware::{error_handling::AppError, identity::Caller},
    ApiState,
};

#[axum::debug_handler]
pub async fn get_stats(
    State(state): State<Arc<ApiState>>,
    Caller(caller): Caller,
) -> Result<Json<StatsSnapshot>, AppError> {
    let now = state.clock.now();
    let stats = state.stats.compute_stats(&caller, now).await?;
    Ok(Json(stats))
}
