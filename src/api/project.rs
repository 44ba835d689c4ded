use actix_web::{HttpResponse, Responder, web};

use super::{SearchQuery, forbid_unless};
use crate::auth::auth::AuthUser;
use crate::model::project::{NewProject, ProjectFilter, ProjectUpdate};
use crate::service::Services;
use crate::store::PageRequest;

/// Create a project owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = NewProject,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Validation error or inverted dates")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Project"
)]
pub async fn create_project(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<NewProject>,
) -> actix_web::Result<impl Responder> {
    let project = services.projects.create_project(auth.user_id, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

/// List projects
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(ProjectFilter, PageRequest),
    responses(
        (status = 200, description = "Paginated projects", body = Object)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Project"
)]
pub async fn list_projects(
    services: web::Data<Services>,
    filter: web::Query<ProjectFilter>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let result = services.projects.list_projects(&filter, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Search projects by name
#[utoipa::path(
    get,
    path = "/api/v1/projects/search",
    params(SearchQuery, PageRequest),
    responses(
        (status = 200, description = "Paginated matches", body = Object)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Project"
)]
pub async fn search_projects(
    services: web::Data<Services>,
    query: web::Query<SearchQuery>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let result = services.projects.search_projects(&query.q, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Get project by ID
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = u64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Project"
)]
pub async fn get_project(services: web::Data<Services>, path: web::Path<u64>) -> actix_web::Result<impl Responder> {
    let project = services.projects.get_project(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Update a project (owner, assignee or HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    params(("id" = u64, Path, description = "Project ID")),
    request_body = ProjectUpdate,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 400, description = "Validation error or inverted dates"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Project"
)]
pub async fn update_project(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<ProjectUpdate>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(services.projects.is_owner(id, &auth.caller()).await?)?;
    let project = services.projects.update_project(id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Delete a project
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id" = u64, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Project"
)]
pub async fn delete_project(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(services.projects.is_owner(id, &auth.caller()).await?)?;
    services.projects.delete_project(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
