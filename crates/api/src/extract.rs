//! Request extractors.

use std::fmt::Display;
use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// Header carrying the authenticated purchaser, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The purchaser making the request.
#[derive(Debug, Clone, Copy)]
pub struct Purchaser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Purchaser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {USER_ID_HEADER} header")))?;

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Purchaser)
            .ok_or_else(|| ApiError::Unauthorized(format!("Invalid {USER_ID_HEADER} header")))
    }
}

/// Parses a path segment into a typed id.
pub fn parse_id<T>(id: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
