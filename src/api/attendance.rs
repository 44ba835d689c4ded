use actix_web::{HttpResponse, Responder, error::ErrorBadRequest, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use super::{ensure_can_read, forbid_unless, visible_user};
use crate::auth::auth::AuthUser;
use crate::model::attendance::{Attendance, AttendanceFilter, AttendanceStatus, MarkAttendance, PunchLocation};
use crate::model::user::Department;
use crate::service::Services;
use crate::store::PageRequest;

#[derive(Debug, Deserialize, IntoParams)]
pub struct HoursQuery {
    /// Defaults to the caller
    pub user_id: Option<u64>,
    /// Single day
    pub date: Option<NaiveDate>,
    /// Range start, inclusive
    pub start_date: Option<NaiveDate>,
    /// Range end, inclusive
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusQuery {
    pub date: Option<NaiveDate>,
}

/// Punch in for today
#[utoipa::path(
    post,
    path = "/api/v1/attendance/punch-in",
    request_body = PunchLocation,
    responses(
        (status = 201, description = "Punched in", body = Attendance),
        (status = 400, description = "Already punched in today", body = Object, example = json!({
            "message": "already punched in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Day already marked absent or on leave")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn punch_in(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: Option<web::Json<PunchLocation>>,
) -> actix_web::Result<impl Responder> {
    let punch = payload.map(|p| p.into_inner()).unwrap_or_default();
    let record = services.attendance.punch_in(auth.user_id, punch).await?;
    Ok(HttpResponse::Created().json(record))
}

/// Punch out for today
#[utoipa::path(
    post,
    path = "/api/v1/attendance/punch-out",
    request_body = PunchLocation,
    responses(
        (status = 200, description = "Punched out", body = Attendance),
        (status = 400, description = "No punch-in found or already punched out", body = Object, example = json!({
            "message": "no punch-in found for today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn punch_out(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: Option<web::Json<PunchLocation>>,
) -> actix_web::Result<impl Responder> {
    let punch = payload.map(|p| p.into_inner()).unwrap_or_default();
    let record = services.attendance.punch_out(auth.user_id, punch).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Today's record for the caller, if any
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's attendance or null", body = Attendance),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, services: web::Data<Services>) -> actix_web::Result<impl Responder> {
    let record = services.attendance.get_today(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Working hours for one day or a date range
#[utoipa::path(
    get,
    path = "/api/v1/attendance/hours",
    params(HoursQuery),
    responses(
        (status = 200, description = "Hours worked", body = Object, example = json!({
            "user_id": 7,
            "hours": 8.5
        })),
        (status = 400, description = "Missing or inverted date range"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn working_hours(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<HoursQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    ensure_can_read(&services, &auth, user_id).await?;

    let hours = match (query.date, query.start_date, query.end_date) {
        (Some(date), _, _) => services.attendance.get_working_hours(user_id, date).await?,
        (None, Some(start), Some(end)) => {
            services
                .attendance
                .get_total_working_hours(user_id, start, end)
                .await?
        }
        _ => return Err(ErrorBadRequest("Provide date or start_date and end_date")),
    };

    Ok(HttpResponse::Ok().json(json!({ "user_id": user_id, "hours": hours })))
}

async fn mark(
    auth: &AuthUser,
    services: &Services,
    payload: MarkAttendance,
    status: AttendanceStatus,
) -> actix_web::Result<Attendance> {
    auth.require_hr_or_admin()?;
    let MarkAttendance { user_id, date, reason } = payload;
    let record = match status {
        AttendanceStatus::Absent => services.attendance.mark_absent(user_id, date, reason).await?,
        AttendanceStatus::HalfDay => services.attendance.mark_half_day(user_id, date, reason).await?,
        _ => services.attendance.mark_on_leave(user_id, date, reason).await?,
    };
    Ok(record)
}

/// Mark a user absent (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/attendance/absent",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Marked absent", body = Attendance),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User already punched in that day")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_absent(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    let record = mark(&auth, &services, payload.into_inner(), AttendanceStatus::Absent).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Mark a half day (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/attendance/half-day",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Marked half day", body = Attendance),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Day already completed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_half_day(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    let record = mark(&auth, &services, payload.into_inner(), AttendanceStatus::HalfDay).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Mark a user on leave (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/attendance/on-leave",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Marked on leave", body = Attendance),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "User already punched in that day")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_on_leave(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    let record = mark(&auth, &services, payload.into_inner(), AttendanceStatus::Leave).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Search attendance
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter, PageRequest),
    responses(
        (status = 200, description = "Paginated attendance", body = Object),
        (status = 400, description = "Inverted date range"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    services: web::Data<Services>,
    filter: web::Query<AttendanceFilter>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let mut filter = filter.into_inner();
    filter.user_id = visible_user(&services, &auth, filter.user_id).await?;

    let result = services.attendance.search_attendance(&filter, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Everyone's attendance on a date (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/date/{date}",
    params(("date" = String, Path, description = "Day, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Attendance on the date", body = [Attendance]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn by_date(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<NaiveDate>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let records = services.attendance.get_attendance_by_date(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// A department's attendance on a date
#[utoipa::path(
    get,
    path = "/api/v1/attendance/department/{department}/{date}",
    params(
        ("department" = Department, Path, description = "Department"),
        ("date" = String, Path, description = "Day, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Department attendance", body = [Attendance]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn by_department(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<(Department, NaiveDate)>,
) -> actix_web::Result<impl Responder> {
    let (department, date) = path.into_inner();
    forbid_unless(services.users.has_access_to_department(&auth.caller(), department))?;

    let records = services
        .attendance
        .get_attendance_by_department_and_date(department, date)
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Attendance with a status, optionally on one date (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/status/{status}",
    params(
        ("status" = AttendanceStatus, Path, description = "Attendance status"),
        StatusQuery
    ),
    responses(
        (status = 200, description = "Matching attendance", body = [Attendance]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn by_status(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<AttendanceStatus>,
    query: web::Query<StatusQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let records = services
        .attendance
        .get_attendance_by_status(path.into_inner(), query.date)
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Get attendance by ID
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance ID")),
    responses(
        (status = 200, description = "Attendance found", body = Attendance),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let record = services.attendance.get_attendance(path.into_inner()).await?;
    ensure_can_read(&services, &auth, record.user_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Delete attendance (Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    services.attendance.delete_attendance(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
