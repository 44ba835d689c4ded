use actix_web::{HttpResponse, Responder, web};

use super::{SearchQuery, ensure_can_read, forbid_unless};
use crate::auth::auth::AuthUser;
use crate::model::review::{NewReview, ReviewFilter, ReviewUpdate};
use crate::service::Services;
use crate::store::PageRequest;

/// Leave feedback about a colleague
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    request_body = NewReview,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Validation error or self-review"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Review"
)]
pub async fn create_review(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<NewReview>,
) -> actix_web::Result<impl Responder> {
    let review = services.reviews.create_review(auth.user_id, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(review))
}

/// List reviews. Without `employee_id`, non-HR callers see the reviews they wrote.
#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    params(ReviewFilter, PageRequest),
    responses(
        (status = 200, description = "Paginated reviews", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Review"
)]
pub async fn list_reviews(
    auth: AuthUser,
    services: web::Data<Services>,
    filter: web::Query<ReviewFilter>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let mut filter = filter.into_inner();
    if !auth.role.is_administrative() {
        match filter.employee_id {
            Some(employee_id) => ensure_can_read(&services, &auth, employee_id).await?,
            None => filter.reviewer_id = Some(auth.user_id),
        }
    }

    let result = services.reviews.list_reviews(&filter, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Search reviews by title (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/reviews/search",
    params(SearchQuery, PageRequest),
    responses(
        (status = 200, description = "Paginated matches", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Review"
)]
pub async fn search_reviews(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<SearchQuery>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let result = services.reviews.search_reviews(&query.q, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Get review by ID
#[utoipa::path(
    get,
    path = "/api/v1/reviews/{id}",
    params(("id" = u64, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review found", body = Review),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Review not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Review"
)]
pub async fn get_review(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let review = services.reviews.get_review(path.into_inner()).await?;
    if review.reviewer_id != auth.user_id {
        ensure_can_read(&services, &auth, review.employee_id).await?;
    }
    Ok(HttpResponse::Ok().json(review))
}

/// Edit a review (author or HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}",
    params(("id" = u64, Path, description = "Review ID")),
    request_body = ReviewUpdate,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Review not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Review"
)]
pub async fn update_review(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<ReviewUpdate>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(services.reviews.is_owner(id, &auth.caller()).await?)?;
    let review = services.reviews.update_review(id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(review))
}

/// Delete a review (author or HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    params(("id" = u64, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Review not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Review"
)]
pub async fn delete_review(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(services.reviews.is_owner(id, &auth.caller()).await?)?;
    services.reviews.delete_review(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
