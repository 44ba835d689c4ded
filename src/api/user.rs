use actix_web::{HttpResponse, Responder, error::ErrorForbidden, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{SearchQuery, ensure_can_read, forbid_unless};
use crate::auth::auth::AuthUser;
use crate::error::ServiceError;
use crate::model::role::Role;
use crate::model::user::{Department, NewUser, UserFilter, UserStatus, UserUpdate};
use crate::service::Services;
use crate::store::PageRequest;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChange {
    #[schema(example = "INACTIVE")]
    pub status: UserStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordChange {
    #[validate(length(min = 1))]
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExistsQuery {
    pub email: Option<String>,
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CountQuery {
    pub department: Option<Department>,
}

/// Create a user (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email or employee ID already in use", body = Object, example = json!({
            "message": "duplicate value for email"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn create_user(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<NewUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let user = services.users.create_user(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// List users. HR/Admin see everyone, managers their direct reports.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserFilter, PageRequest),
    responses(
        (status = 200, description = "Paginated users", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    services: web::Data<Services>,
    filter: web::Query<UserFilter>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let mut filter = filter.into_inner();
    match auth.role {
        Role::Admin | Role::Hr => {}
        Role::Manager => filter.manager_id = Some(auth.user_id),
        Role::Employee => return Err(ErrorForbidden("Forbidden")),
    }

    let result = services.users.list_users(&filter, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Search users by name or email (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    params(SearchQuery, PageRequest),
    responses(
        (status = 200, description = "Paginated matches", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn search_users(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<SearchQuery>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let result = services.users.search_users(&query.q, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Whether an email or employee ID is taken (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/exists",
    params(ExistsQuery),
    responses(
        (status = 200, description = "Availability", body = Object, example = json!({
            "email": true,
            "employee_id": false
        })),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn exists(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<ExistsQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let email = match &query.email {
        Some(email) => Some(services.users.exists_by_email(email).await?),
        None => None,
    };
    let employee_id = match &query.employee_id {
        Some(code) => Some(services.users.exists_by_employee_id(code).await?),
        None => None,
    };
    Ok(HttpResponse::Ok().json(json!({ "email": email, "employee_id": employee_id })))
}

/// Head counts (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/count",
    params(CountQuery),
    responses(
        (status = 200, description = "Counts", body = Object, example = json!({
            "total": 42,
            "active": 40,
            "department": 12
        })),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn count_users(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<CountQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let total = services.users.count_users(&UserFilter::default()).await?;
    let active = services.users.count_active().await?;
    let department = match query.department {
        Some(department) => Some(services.users.count_by_department(department).await?),
        None => None,
    };
    Ok(HttpResponse::Ok().json(json!({ "total": total, "active": active, "department": department })))
}

/// Direct reports of the caller
#[utoipa::path(
    get,
    path = "/api/v1/users/team",
    responses(
        (status = 200, description = "Team members", body = [User])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn team(auth: AuthUser, services: web::Data<Services>) -> actix_web::Result<impl Responder> {
    let team = services.users.get_team(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(team))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let user = services.users.get_user(id).await?;
    ensure_can_read(&services, &auth, id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Update a user. Non-HR callers may only edit their own contact details.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email or employee ID already in use")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn update_user(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<UserUpdate>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let update = payload.into_inner();

    if !auth.role.is_administrative() {
        forbid_unless(id == auth.user_id)?;
        let privileged = update.employee_id.is_some()
            || update.role.is_some()
            || update.department.is_some()
            || update.manager_id.is_some()
            || update.base_salary.is_some()
            || update.hire_date.is_some();
        forbid_unless(!privileged)?;
    }

    let user = services.users.update_user(id, update).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Change account status (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/status",
    params(("id" = u64, Path, description = "User ID")),
    request_body = StatusChange,
    responses(
        (status = 200, description = "Status changed", body = User),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn update_status(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<StatusChange>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let user = services
        .users
        .update_status(path.into_inner(), payload.status)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Change the caller's own password
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/password",
    params(("id" = u64, Path, description = "User ID")),
    request_body = PasswordChange,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is wrong"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn change_password(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<PasswordChange>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(id == auth.user_id)?;
    payload.validate().map_err(ServiceError::from)?;

    services
        .users
        .change_password(id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete a user (Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn delete_user(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    services.users.delete_user(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
