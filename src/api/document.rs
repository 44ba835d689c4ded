use actix_web::{HttpResponse, Responder, web};

use super::{SearchQuery, ensure_can_read, forbid_unless, visible_user};
use crate::auth::auth::AuthUser;
use crate::model::document::{DocumentFilter, DocumentUpdate, NewDocument};
use crate::service::Services;
use crate::store::PageRequest;

/// Upload document metadata. Filing for someone else needs HR/Admin.
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body = NewDocument,
    responses(
        (status = 201, description = "Document created", body = Document),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Document"
)]
pub async fn create_document(
    auth: AuthUser,
    services: web::Data<Services>,
    payload: web::Json<NewDocument>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    if payload.owner_id.is_some_and(|owner| owner != auth.user_id) {
        auth.require_hr_or_admin()?;
    }
    let document = services.documents.create_document(auth.user_id, payload).await?;
    Ok(HttpResponse::Created().json(document))
}

/// List documents
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    params(DocumentFilter, PageRequest),
    responses(
        (status = 200, description = "Paginated documents", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Document"
)]
pub async fn list_documents(
    auth: AuthUser,
    services: web::Data<Services>,
    filter: web::Query<DocumentFilter>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    let mut filter = filter.into_inner();
    filter.owner_id = visible_user(&services, &auth, filter.owner_id).await?;

    let result = services.documents.list_documents(&filter, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Search every document by title or description (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/documents/search",
    params(SearchQuery, PageRequest),
    responses(
        (status = 200, description = "Paginated matches", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Document"
)]
pub async fn search_documents(
    auth: AuthUser,
    services: web::Data<Services>,
    query: web::Query<SearchQuery>,
    page: web::Query<PageRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let result = services.documents.search_documents(&query.q, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Get document by ID
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    params(("id" = u64, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document found", body = Document),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Document not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Document"
)]
pub async fn get_document(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let document = services.documents.get_document(path.into_inner()).await?;
    ensure_can_read(&services, &auth, document.owner_id).await?;
    Ok(HttpResponse::Ok().json(document))
}

/// Update document metadata
#[utoipa::path(
    put,
    path = "/api/v1/documents/{id}",
    params(("id" = u64, Path, description = "Document ID")),
    request_body = DocumentUpdate,
    responses(
        (status = 200, description = "Document updated", body = Document),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Document not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Document"
)]
pub async fn update_document(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
    payload: web::Json<DocumentUpdate>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(services.documents.is_owner(id, &auth.caller()).await?)?;
    let document = services.documents.update_document(id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(document))
}

/// Delete a document
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    params(("id" = u64, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Document not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Document"
)]
pub async fn delete_document(
    auth: AuthUser,
    services: web::Data<Services>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    forbid_unless(services.documents.is_owner(id, &auth.caller()).await?)?;
    services.documents.delete_document(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
