use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the domain services.
///
/// Every variant is a recoverable, caller-facing condition except `Storage`
/// and `Internal`, which are reported as server errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed for: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("duplicate value for {0}")]
    DuplicateKey(String),

    #[error("cannot {action} {entity} in state {from}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("already punched in today")]
    AlreadyPunchedIn,

    #[error("already punched out today")]
    AlreadyPunchedOut,

    #[error("no punch-in found for today")]
    NoPunchInFound,

    #[error("attendance for {0} is already finalized")]
    RecordAlreadyFinalized(NaiveDate),

    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("storage error: {0}")]
    Storage(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn transition(entity: &'static str, from: impl ToString, action: &'static str) -> Self {
        ServiceError::InvalidStateTransition {
            entity,
            from: from.to_string(),
            action,
        }
    }

    pub fn invalid(field: &str) -> Self {
        ServiceError::Validation(vec![field.to_string()])
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => ServiceError::DuplicateKey(key),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        ServiceError::Validation(fields)
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Validation(_)
            | ServiceError::AlreadyPunchedIn
            | ServiceError::AlreadyPunchedOut
            | ServiceError::NoPunchInFound
            | ServiceError::InvalidDateRange { .. } => StatusCode::BAD_REQUEST,
            ServiceError::DuplicateKey(_)
            | ServiceError::InvalidStateTransition { .. }
            | ServiceError::RecordAlreadyFinalized(_) => StatusCode::CONFLICT,
            ServiceError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::Storage(_) | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Storage(_) | ServiceError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                HttpResponse::InternalServerError().json(json!({
                    "message": "Internal Server Error"
                }))
            }
            ServiceError::Validation(fields) => {
                HttpResponse::build(self.status_code()).json(json!({
                    "message": self.to_string(),
                    "fields": fields,
                }))
            }
            _ => HttpResponse::build(self.status_code()).json(json!({
                "message": self.to_string()
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_store_error_becomes_duplicate_key() {
        let err: ServiceError = StoreError::Duplicate("email".into()).into();
        assert!(matches!(err, ServiceError::DuplicateKey(ref key) if key == "email"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_message_lists_fields() {
        let err = ServiceError::Validation(vec!["email".into(), "first_name".into()]);
        assert_eq!(err.to_string(), "validation failed for: email, first_name");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
