//! Service error taxonomy and its mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::store::student::StudentId;

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Student with this ID already exists.")]
    Conflict(StudentId),

    #[error("Student not found.")]
    NotFound(StudentId),

    #[error("Student failed validation ({} field(s))", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),

    #[error("Error connecting to Ollama API: {0}")]
    UpstreamUnavailable(String),

    #[error("Error parsing response from Ollama API.")]
    UpstreamProtocol(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Conflict(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_)
            | ServiceError::InvalidBody(_)
            | ServiceError::InvalidPath(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::UpstreamUnavailable(_) | ServiceError::UpstreamProtocol(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            ServiceError::Validation(fields) => json!({ "detail": fields }),
            other => json!({ "detail": other.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}
