//! # Caller Identity
//!
//! Identity verification happens upstream. The gateway forwards the verified
//! caller in two headers, which this extractor turns into an [`Identity`]:
//!
//! - `X-User-Kind`: `teacher` or `student`
//! - `X-User-Id`: the caller's UUID
//!
//! A request without both headers is rejected with `401`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use officehours_core::{
    errors::SchedulingError,
    models::identity::{Identity, UserKind},
};
use uuid::Uuid;

use super::error_handling::AppError;

pub const USER_KIND_HEADER: &str = "x-user-kind";
pub const USER_ID_HEADER: &str = "x-user-id";

/// The verified caller of the current request.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| {
            AppError(SchedulingError::Authentication(format!(
                "Missing {} header",
                name
            )))
        })?
        .to_str()
        .map_err(|_| {
            AppError(SchedulingError::Authentication(format!(
                "Malformed {} header",
                name
            )))
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let kind = header(parts, USER_KIND_HEADER)?
            .parse::<UserKind>()
            .map_err(|e| AppError(SchedulingError::Authentication(e.to_string())))?;

        let id = Uuid::parse_str(header(parts, USER_ID_HEADER)?.trim()).map_err(|_| {
            AppError(SchedulingError::Authentication(
                "X-User-Id must be a UUID".to_string(),
            ))
        })?;

        Ok(Caller(Identity { kind, id }))
    }
}
