//! Error types for the library catalog server

use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Where clients are sent when a reader-only endpoint is hit without credentials
pub const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Stable error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthenticated = 2,
    NotAuthorized = 3,
    DbFailure = 4,
    NotFound = 5,
    BadValue = 6,
    Duplicate = 7,
    NotLendable = 8,
}

/// Field name -> messages, as shown next to form inputs
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Credentials were supplied but rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No usable credentials on a reader-only endpoint
    #[error("Login required: {0}")]
    LoginRequired(String),

    #[error("Permission denied: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid form submission")]
    InvalidForm(FieldErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

impl AppError {
    /// Single field-level validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.into()]);
        AppError::InvalidForm(fields)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::InvalidForm(fields)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let (field, message) = json_rejection_field(&rejection.body_text());
        AppError::field(&field, message)
    }
}

/// Field named by a JSON body rejection, or `body` when serde names none.
///
/// Data errors read `...target type: <path>: <message>` for nested fields and
/// `...target type: missing field `name` ...` at the top level.
fn json_rejection_field(text: &str) -> (String, String) {
    let detail = text
        .split_once("target type: ")
        .map(|(_, rest)| rest)
        .unwrap_or(text);

    if let Some((path, message)) = detail.split_once(": ") {
        if !path.is_empty() && !path.contains(' ') {
            return (path.to_string(), message.to_string());
        }
    }

    if let Some(rest) = detail.strip_prefix("missing field `") {
        if let Some((name, _)) = rest.split_once('`') {
            return (name.to_string(), "This field is required".to_string());
        }
    }

    ("body".to_string(), detail.to_string())
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Field-level messages for invalid form submissions
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;
        let (status, code, message) = match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthenticated, msg)
            }
            AppError::LoginRequired(msg) => {
                (StatusCode::SEE_OTHER, ErrorCode::NotAuthenticated, msg)
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg),
            AppError::InvalidForm(errors) => {
                fields = Some(errors);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::BadValue,
                    "Please correct the errors below".to_string(),
                )
            }
            AppError::Database(e) => database_failure(e),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::BusinessRule(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::NotLendable, msg)
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            fields,
        });

        if status == StatusCode::SEE_OTHER {
            return (status, [(LOCATION, LOGIN_PATH)], body).into_response();
        }

        (status, body).into_response()
    }
}

/// Constraint violations surface as client errors, everything else as 500
fn database_failure(e: sqlx::Error) -> (StatusCode, ErrorCode, String) {
    let pg_code = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());

    match pg_code.as_deref() {
        Some("23505") => (
            StatusCode::CONFLICT,
            ErrorCode::Duplicate,
            "Record already exists".to_string(),
        ),
        Some("23503") => (
            StatusCode::BAD_REQUEST,
            ErrorCode::BadValue,
            "Referenced record does not exist".to_string(),
        ),
        Some("23514") => (
            StatusCode::BAD_REQUEST,
            ErrorCode::BadValue,
            "Value violates a catalog constraint".to_string(),
        ),
        _ => {
            tracing::error!("Database error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DbFailure,
                "Database error".to_string(),
            )
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
