//! Problem-details (RFC 7807) error responses.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use devhabit_lib::devhabit_query::QueryError;
use devhabit_lib::{DbError, DevHabitError, PatchError, ValidationErrors};
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

pub const PROBLEM_JSON: &str = "application/problem+json";

/// Problem document body. `request_id` is filled in by the request-id
/// middleware after the handler has returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: &'static str,
    pub title: &'static str,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ProblemDetails {
    pub fn into_response_with(self, status: StatusCode) -> Response {
        let mut response = (status, Json(&self)).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));
        response.extensions_mut().insert(self);
        response
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: Option<String>,
    pub errors: Option<ValidationErrors>,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: Some(detail.into()),
            errors: None,
        }
    }

    /// A bare status with no detail, like an empty 404.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            detail: None,
            errors: None,
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found() -> Self {
        Self::status(StatusCode::NOT_FOUND)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, detail)
    }

    pub fn gone() -> Self {
        Self::status(StatusCode::GONE)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred.",
        )
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: Some("One or more validation errors occurred.".to_string()),
            errors: Some(errors),
        }
    }

    fn problem_type(&self) -> &'static str {
        match self.status {
            StatusCode::BAD_REQUEST => "https://tools.ietf.org/html/rfc9110#section-15.5.1",
            StatusCode::NOT_FOUND => "https://tools.ietf.org/html/rfc9110#section-15.5.5",
            StatusCode::CONFLICT => "https://tools.ietf.org/html/rfc9110#section-15.5.10",
            StatusCode::GONE => "https://tools.ietf.org/html/rfc9110#section-15.5.11",
            _ => "https://tools.ietf.org/html/rfc9110#section-15.6.1",
        }
    }

    pub fn to_problem(&self) -> ProblemDetails {
        ProblemDetails {
            problem_type: self.problem_type(),
            title: self.status.canonical_reason().unwrap_or("Error"),
            status: self.status.as_u16(),
            detail: self.detail.clone(),
            errors: self.errors.clone(),
            request_id: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.status, detail),
            None => write!(f, "{}", self.status),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.to_problem().into_response_with(self.status)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(msg) => Self::conflict(msg),
            other => {
                tracing::error!(error = %other, "database operation failed");
                Self::internal()
            }
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidPage(msg) => Self::bad_request(msg),
            other => {
                tracing::error!(error = %other, "query configuration error");
                Self::internal()
            }
        }
    }
}

impl From<PatchError> for ApiError {
    fn from(err: PatchError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        tracing::warn!(%errors, "request failed validation");
        Self::validation(errors)
    }
}

impl From<DevHabitError> for ApiError {
    fn from(err: DevHabitError) -> Self {
        match err {
            DevHabitError::Db(e) => e.into(),
            DevHabitError::Query(e) => e.into(),
            DevHabitError::Validation(e) => e.into(),
            DevHabitError::Patch(e) => e.into(),
            DevHabitError::InvalidInput(msg) => Self::bad_request(msg),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}
