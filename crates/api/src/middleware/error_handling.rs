//! # Error Handling Middleware
//!
//! Maps scheduling errors to HTTP status codes and JSON error bodies so
//! every endpoint reports failures the same way:
//!
//! ```json
//! { "error": "Conflict: Appointment ... was modified concurrently; re-fetch and retry" }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use officehours_core::errors::SchedulingError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use officehours_api::middleware::error_handling::AppError;
/// use officehours_core::errors::SchedulingError;
///
/// async fn handler(ok: bool) -> Result<Json<&'static str>, AppError> {
///     if !ok {
///         return Err(AppError(SchedulingError::NotFound("nothing here".into())));
///     }
///     Ok(Json("found"))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub SchedulingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SchedulingError::Validation(_) => StatusCode::BAD_REQUEST,
            SchedulingError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulingError::Authentication(_) => StatusCode::UNAUTHORIZED,
            SchedulingError::Forbidden(_) => StatusCode::FORBIDDEN,
            SchedulingError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SchedulingError::Conflict(_) => StatusCode::CONFLICT,
            SchedulingError::SlotUnavailable(_) => StatusCode::CONFLICT,
            SchedulingError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage failures carry internals; log them, return a generic message
        let message = match &self.0 {
            SchedulingError::Unavailable(report) => {
                error!("storage failure: {:?}", report);
                "Storage temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Allows `?` on `SchedulingResult` inside handlers
impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        AppError(err)
    }
}

/// Storage reports surface as `Unavailable`
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(SchedulingError::Unavailable(err))
    }
}

/// Maps a SchedulingError directly to an HTTP response
pub fn map_error(err: SchedulingError) -> Response {
    AppError(err).into_response()
}
