use actix_web::{HttpResponse, Responder, error::ErrorBadRequest, web};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{ensure_can_read, forbid_unless};
use crate::auth::auth::AuthUser;
use crate::model::user::Department;
use crate::service::Services;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeQuery {
    /// Defaults to the first of the current month
    pub start_date: Option<NaiveDate>,
    /// Defaults to today
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveStatsQuery {
    /// HR/Admin only; everybody else gets their own figures
    pub user_id: Option<u64>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PeriodQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQuery {
    pub user_id: Option<u64>,
}

/// Organisation-wide attendance for a day (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/statistics/attendance",
    params(DayQuery),
    responses(
        (status = 200, description = "Attendance statistics", body = AttendanceStatistics),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn attendance(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<DayQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let stats = services.statistics.attendance_statistics(query.date).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// One department's attendance for a day
#[utoipa::path(
    get,
    path = "/api/v1/statistics/attendance/department/{department}",
    params(("department" = Department, Path, description = "Department"), DayQuery),
    responses(
        (status = 200, description = "Department statistics", body = DepartmentAttendanceStatistics),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn department_attendance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<Department>,
    query: web::Query<DayQuery>,
) -> actix_web::Result<impl Responder> {
    let department = path.into_inner();
    forbid_unless(services.users.has_access_to_department(&auth.caller(), department))?;
    let stats = services
        .statistics
        .department_attendance_statistics(department, query.date)
        .await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// A user's attendance over a date range
#[utoipa::path(
    get,
    path = "/api/v1/statistics/attendance/user/{id}",
    params(("id" = u64, Path, description = "User ID"), RangeQuery),
    responses(
        (status = 200, description = "User statistics", body = UserAttendanceStatistics),
        (status = 400, description = "Inverted date range"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn user_attendance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    ensure_can_read(&services, &auth, user_id).await?;

    let today = services.today();
    let stats = match (query.start_date, query.end_date) {
        (None, None) => services.statistics.month_to_date(user_id, today).await?,
        (start, end) => {
            let end = end.unwrap_or(today);
            let start = match start {
                Some(start) => start,
                None => end.with_day(1).ok_or_else(|| ErrorBadRequest("Invalid end_date"))?,
            };
            services
                .statistics
                .user_attendance_statistics(user_id, start, end)
                .await?
        }
    };
    Ok(HttpResponse::Ok().json(stats))
}

/// Leave request breakdown
#[utoipa::path(
    get,
    path = "/api/v1/statistics/leave",
    params(LeaveStatsQuery),
    responses(
        (status = 200, description = "Leave statistics", body = LeaveStatistics),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn leave(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<LeaveStatsQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = if auth.role.is_administrative() {
        query.user_id
    } else {
        let user_id = query.user_id.unwrap_or(auth.user_id);
        ensure_can_read(&services, &auth, user_id).await?;
        Some(user_id)
    };
    let stats = services.statistics.leave_statistics(user_id, query.year).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Payroll totals for a month (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/statistics/payroll",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Payroll statistics", body = PayrollStatistics),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn payroll(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let stats = services.statistics.payroll_statistics(query.month, query.year).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Performance review breakdown
#[utoipa::path(
    get,
    path = "/api/v1/statistics/performance",
    params(UserQuery),
    responses(
        (status = 200, description = "Performance statistics", body = PerformanceStatistics),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn performance(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = if auth.role.is_administrative() {
        query.user_id
    } else {
        let user_id = query.user_id.unwrap_or(auth.user_id);
        ensure_can_read(&services, &auth, user_id).await?;
        Some(user_id)
    };
    let stats = services.statistics.performance_statistics(user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}
