//! Request identity.
//!
//! Authentication happens upstream; the gateway forwards the user id in the
//! `x-user-id` header and every query is scoped to it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::handlers::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user of the current request.
/// Add this as a handler parameter to require a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing user identity"))?;

        Ok(CurrentUser {
            user_id: user_id.to_string(),
        })
    }
}
