pub mod attendance;
pub mod dashboard;
pub mod document;
pub mod leave;
pub mod payroll;
pub mod performance;
pub mod project;
pub mod review;
pub mod statistics;
pub mod user;

use actix_web::error::ErrorForbidden;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::service::Services;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive search term
    pub q: String,
}

pub(crate) fn forbid_unless(allowed: bool) -> actix_web::Result<()> {
    if allowed { Ok(()) } else { Err(ErrorForbidden("Forbidden")) }
}

/// Read access to the records of `owner_id`.
pub(crate) async fn ensure_can_read(services: &Services, auth: &AuthUser, owner_id: u64) -> actix_web::Result<()> {
    forbid_unless(services.users.has_access_to_user(&auth.caller(), owner_id).await?)
}

/// User a list query is narrowed to. HR and admins may list everyone;
/// everybody else sees their own records, or a report's when they ask.
pub(crate) async fn visible_user(
    services: &Services,
    auth: &AuthUser,
    requested: Option<u64>,
) -> actix_web::Result<Option<u64>> {
    if auth.role.is_administrative() {
        return Ok(requested);
    }
    match requested {
        Some(user_id) => {
            ensure_can_read(services, auth, user_id).await?;
            Ok(Some(user_id))
        }
        None => Ok(Some(auth.user_id)),
    }
}
