use actix_web::{HttpResponse, Responder, web};

use super::{ensure_can_read, forbid_unless, visible_user};
use crate::auth::auth::AuthUser;
use crate::model::leave::{CreateLeave, LeaveFilter, RejectLeave};
use crate::service::Services;
use crate::store::PageRequest;

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave requested", body = Leave),
        (status = 400, description = "Invalid or overlapping dates", body = Object, example = json!({
            "message": "validation failed for: start_date, end_date",
            "fields": ["start_date", "end_date"]
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let leave = services.leaves.apply_leave(auth.user_id, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(leave))
}

/// List leave requests
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter, PageRequest),
    responses(
        (status = 200, description = "Paginated leave requests", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leaves(
    auth: AuthUser,
    services: web::Data<Services>,
    filter: web::Query<LeaveFilter>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let mut filter = filter.into_inner();
    filter.user_id = visible_user(&services, &auth, filter.user_id).await?;

    let result = services.leaves.list_leaves(&filter, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Pending requests awaiting a decision (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/leave/pending",
    params(PageRequest),
    responses(
        (status = 200, description = "Paginated pending requests", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn pending_leaves(
    auth: AuthUser,
    services: web::Data<Services>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let result = services.leaves.get_pending_leaves(page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Get leave by ID
#[utoipa::path(
    get,
    path = "/api/v1/leave/{id}",
    params(("id" = u64, Path, description = "Leave ID")),
    responses(
        (status = 200, description = "Leave found", body = Leave),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = services.leaves.get_leave(path.into_inner()).await?;
    ensure_can_read(&services, &auth, leave.user_id).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Approve a pending request
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/approve",
    params(("id" = u64, Path, description = "Leave ID")),
    responses(
        (status = 200, description = "Leave approved", body = Leave),
        (status = 403, description = "Caller may not decide this request"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;
    let leave = services.leaves.approve_leave(path.into_inner(), &auth.caller()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Reject a pending request
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/reject",
    params(("id" = u64, Path, description = "Leave ID")),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = Leave),
        (status = 400, description = "Missing reason"),
        (status = 403, description = "Caller may not decide this request"),
        (status = 409, description = "Leave is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;
    let leave = services
        .leaves
        .reject_leave(path.into_inner(), &auth.caller(), payload.into_inner().reason)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Cancel a request
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/cancel",
    params(("id" = u64, Path, description = "Leave ID")),
    responses(
        (status = 200, description = "Leave cancelled", body = Leave),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Leave can no longer be cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = services.leaves.cancel_leave(path.into_inner(), &auth.caller()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Delete a pending or cancelled request
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{id}",
    params(("id" = u64, Path, description = "Leave ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave was already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(services.leaves.is_owner(id, &auth.caller()).await?)?;
    services.leaves.delete_leave(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
