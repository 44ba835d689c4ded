use actix_web::{HttpResponse, Responder, web};

use super::{ensure_can_read, visible_user};
use crate::auth::auth::AuthUser;
use crate::model::payroll::{CreatePayroll, GeneratePayroll, PayrollFilter, UpdatePayroll};
use crate::service::Services;
use crate::store::PageRequest;

/// Create a payroll (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created", body = Payroll),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Payroll already exists for that period")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<CreatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payroll = services.payroll.create_payroll(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(payroll))
}

/// Generate payrolls for every active employee (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/v1/payroll/generate",
    request_body = GeneratePayroll,
    responses(
        (status = 200, description = "Batch report", body = PayrollBatchReport),
        (status = 400, description = "Invalid month or year"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<GeneratePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let GeneratePayroll { month, year } = payload.into_inner();
    let report = services.payroll.generate_payroll(month, year).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Update a pending payroll (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/payroll/{id}",
    params(("id" = u64, Path, description = "Payroll ID")),
    request_body = UpdatePayroll,
    responses(
        (status = 200, description = "Payroll updated", body = Payroll),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Payroll not found"),
        (status = 409, description = "Payroll is no longer pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<UpdatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payroll = services
        .payroll
        .update_payroll(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(payroll))
}

/// Process a pending payroll (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/payroll/{id}/process",
    params(("id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 200, description = "Payroll processed", body = Payroll),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Payroll is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn process_payroll(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payroll = services.payroll.process_payroll(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payroll))
}

/// Mark a processed payroll as paid (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/payroll/{id}/pay",
    params(("id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 200, description = "Payroll paid", body = Payroll),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Payroll is not processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn pay_payroll(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payroll = services.payroll.mark_as_paid(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payroll))
}

/// List payrolls
#[utoipa::path(
    get,
    path = "/api/v1/payroll",
    params(PayrollFilter, PageRequest),
    responses(
        (status = 200, description = "Paginated payrolls", body = Object, example = json!({
            "data": [],
            "page": 1,
            "per_page": 20,
            "total": 0
        })),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    services: web::Data<Services>,
    filter: web::Query<PayrollFilter>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let mut filter = filter.into_inner();
    filter.user_id = visible_user(&services, &auth, filter.user_id).await?;

    let result = services.payroll.list_payrolls(&filter, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Get payroll by ID
#[utoipa::path(
    get,
    path = "/api/v1/payroll/{id}",
    params(("id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 200, description = "Payroll found", body = Payroll),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Payroll not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let payroll = services.payroll.get_payroll(path.into_inner()).await?;
    ensure_can_read(&services, &auth, payroll.user_id).await?;
    Ok(HttpResponse::Ok().json(payroll))
}

/// Delete a pending payroll (HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/payroll/{id}",
    params(("id" = u64, Path, description = "Payroll ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Payroll is no longer pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Payroll"
)]
pub async fn delete_payroll(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    services.payroll.delete_payroll(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
