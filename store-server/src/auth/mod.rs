//! Identity extractors
//!
//! Authentication and session management live in an upstream collaborator;
//! this server trusts the identity headers it injects:
//!
//! - `x-user-id`: numeric user id (required on user-facing routes)
//! - `x-user-role`: `admin` unlocks the admin surface

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::utils::AppError;

/// Authenticated storefront user
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: i64,
}

/// Authenticated admin
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub user_id: i64,
}

fn user_id_from_parts(parts: &Parts) -> Result<i64, AppError> {
    parts
        .headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or(AppError::Unauthorized)
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser {
            user_id: user_id_from_parts(parts)?,
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = user_id_from_parts(parts)?;
        let is_admin = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .map(|r| r.eq_ignore_ascii_case("admin"))
            .unwrap_or(false);
        if !is_admin {
            return Err(AppError::Forbidden("Admin role required".into()));
        }
        Ok(AdminUser { user_id })
    }
}
