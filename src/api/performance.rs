use actix_web::{HttpResponse, Responder, web};

use super::{ensure_can_read, forbid_unless, visible_user};
use crate::auth::auth::AuthUser;
use crate::model::performance::{
    PerformanceFilter, RejectPerformance, ReviewPerformance, SubmitPerformance, UpdatePerformance,
};
use crate::service::Services;
use crate::store::PageRequest;

/// Submit a performance self-review
#[utoipa::path(
    post,
    path = "/api/v1/performance",
    request_body = SubmitPerformance,
    responses(
        (status = 201, description = "Submitted", body = Performance),
        (status = 400, description = "Validation error or inverted period")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn submit_performance(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<SubmitPerformance>,
) -> actix_web::Result<impl Responder> {
    let performance = services
        .performance
        .submit_performance(auth.user_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(performance))
}

/// List performance reviews
#[utoipa::path(
    get,
    path = "/api/v1/performance",
    params(PerformanceFilter, PageRequest),
    responses(
        (status = 200, description = "Paginated performance reviews", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn list_performances(
    auth: AuthUser,
    services: web::Data<Services>,
    filter: web::Query<PerformanceFilter>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let mut filter = filter.into_inner();
    filter.user_id = visible_user(&services, &auth, filter.user_id).await?;

    let result = services
        .performance
        .list_performances(&filter, page.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Get a performance review by ID
#[utoipa::path(
    get,
    path = "/api/v1/performance/{id}",
    params(("id" = u64, Path, description = "Performance ID")),
    responses(
        (status = 200, description = "Found", body = Performance),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn get_performance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let performance = services.performance.get_performance(path.into_inner()).await?;
    ensure_can_read(&services, &auth, performance.user_id).await?;
    Ok(HttpResponse::Ok().json(performance))
}

/// Edit a pending submission
#[utoipa::path(
    put,
    path = "/api/v1/performance/{id}",
    params(("id" = u64, Path, description = "Performance ID")),
    request_body = UpdatePerformance,
    responses(
        (status = 200, description = "Updated", body = Performance),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Already under review")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn update_performance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<UpdatePerformance>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(services.performance.is_owner(id, &auth.caller()).await?)?;
    let performance = services
        .performance
        .update_performance(id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(performance))
}

/// Rate a pending submission
#[utoipa::path(
    put,
    path = "/api/v1/performance/{id}/review",
    params(("id" = u64, Path, description = "Performance ID")),
    request_body = ReviewPerformance,
    responses(
        (status = 200, description = "Under review", body = Performance),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 403, description = "Caller may not review this employee"),
        (status = 409, description = "Not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn review_performance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<ReviewPerformance>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;
    let performance = services
        .performance
        .review_performance(path.into_inner(), &auth.caller(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(performance))
}

/// Complete a reviewed submission
#[utoipa::path(
    put,
    path = "/api/v1/performance/{id}/approve",
    params(("id" = u64, Path, description = "Performance ID")),
    responses(
        (status = 200, description = "Completed", body = Performance),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Not under review")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn approve_performance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;
    let performance = services
        .performance
        .approve_performance(path.into_inner(), &auth.caller())
        .await?;
    Ok(HttpResponse::Ok().json(performance))
}

/// Reject a reviewed submission
#[utoipa::path(
    put,
    path = "/api/v1/performance/{id}/reject",
    params(("id" = u64, Path, description = "Performance ID")),
    request_body = RejectPerformance,
    responses(
        (status = 200, description = "Rejected", body = Performance),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Not under review")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn reject_performance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<RejectPerformance>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;
    let performance = services
        .performance
        .reject_performance(path.into_inner(), &auth.caller(), payload.into_inner().reason)
        .await?;
    Ok(HttpResponse::Ok().json(performance))
}

/// Delete a performance review (HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/performance/{id}",
    params(("id" = u64, Path, description = "Performance ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn delete_performance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    services.performance.delete_performance(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
