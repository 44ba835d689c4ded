use actix_web::{HttpResponse, Responder, web};

use super::ensure_can_read;
use crate::api::statistics::DayQuery;
use crate::auth::auth::AuthUser;
use crate::service::Services;

/// Organisation overview (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(DayQuery),
    responses(
        (status = 200, description = "Organisation dashboard", body = DashboardStatistics),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn organisation(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<DayQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let date = query.date.unwrap_or_else(|| services.today());
    let summary = services.dashboard.organisation_summary(date).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// The caller's own dashboard
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/me",
    params(DayQuery),
    responses(
        (status = 200, description = "Employee dashboard", body = EmployeeDashboard)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn mine(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<DayQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| services.today());
    let summary = services.dashboard.employee_summary(auth.user_id, date).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Someone else's dashboard, subject to the usual read rules
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/user/{id}",
    params(("id" = u64, Path, description = "User ID"), DayQuery),
    responses(
        (status = 200, description = "Employee dashboard", body = EmployeeDashboard),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn employee(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    query: web::Query<DayQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    ensure_can_read(&services, &auth, user_id).await?;
    let date = query.date.unwrap_or_else(|| services.today());
    let summary = services.dashboard.employee_summary(user_id, date).await?;
    Ok(HttpResponse::Ok().json(summary))
}
