//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{BucketError, DomainError, QueryError, RepositoryError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Bucket(
            BucketError::BucketFull { .. }
            | BucketError::InvalidSize { .. }
            | BucketError::DuplicateItem(_),
        ) => StatusCode::CONFLICT,
        DomainError::BucketNotFound(_) | DomainError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Query(
            QueryError::PropertyNotFound { .. }
            | QueryError::PropertyNotComparable { .. }
            | QueryError::EmptySort,
        ) => StatusCode::BAD_REQUEST,
        DomainError::Repository(repo_err) => match repo_err {
            RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
            RepositoryError::AlreadyExists(_) | RepositoryError::ConcurrencyConflict { .. } => {
                StatusCode::CONFLICT
            }
            RepositoryError::MissingIdentity | RepositoryError::Unsupported(_) => {
                StatusCode::BAD_REQUEST
            }
            RepositoryError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Domain(err.into())
    }
}
