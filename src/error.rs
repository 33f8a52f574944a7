// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseError;
use crate::form::{FieldsDecodeError, MalformedIdentifier, ValidationErrors};

pub const DOES_NOT_EXIST: &str = "Does not exist.";
pub const ALREADY_EXISTS: &str = "Already exists.";
pub const INVALID_URL: &str = "Invalid url.";

/// Every failure a form handler can produce. `IntoResponse` below is the one
/// place these are turned into status codes and bodies.
#[derive(Debug)]
pub enum ApiError {
    // 400, body is the bare field -> messages map
    Validation(ValidationErrors),

    // 400, well-formed id with no matching row
    DoesNotExist,

    // 404, a collection query that matched nothing
    NoMatches,

    // 404, identifier in the URL is not a positive integer
    InvalidUrl,

    // 400, (title, owner, fields) already taken
    AlreadyExists,

    // 413, body exceeds the configured request size
    PayloadTooLarge,

    // 500, a stored row that cannot be turned back into a Form
    DataIntegrity(String),

    // 500
    InternalServerError(String),

    // 503
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::DoesNotExist => 400,
            ApiError::NoMatches => 404,
            ApiError::InvalidUrl => 404,
            ApiError::AlreadyExists => 400,
            ApiError::PayloadTooLarge => 413,
            ApiError::DataIntegrity(_) => 500,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(_) => "Validation failed.",
            ApiError::DoesNotExist | ApiError::NoMatches => DOES_NOT_EXIST,
            ApiError::InvalidUrl => INVALID_URL,
            ApiError::AlreadyExists => ALREADY_EXISTS,
            ApiError::PayloadTooLarge => "Request body too large.",
            ApiError::DataIntegrity(_) => "Internal server error.",
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation(errors) => json!(errors),
            _ => json!({ "error": self.message() }),
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<MalformedIdentifier> for ApiError {
    fn from(err: MalformedIdentifier) -> Self {
        tracing::debug!("Rejected request: {}", err);
        ApiError::InvalidUrl
    }
}

impl From<FieldsDecodeError> for ApiError {
    fn from(err: FieldsDecodeError) -> Self {
        tracing::error!("Data integrity error: {}", err);
        ApiError::DataIntegrity(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(constraint) => {
                tracing::warn!("Unique constraint {} rejected write", constraint);
                ApiError::AlreadyExists
            }
            DatabaseError::ConnectionError(msg) => {
                tracing::error!("Database connection error: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => {
                tracing::error!("Database pool timed out");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            DatabaseError::InvalidDatabaseUrl | DatabaseError::MigrationError(_) => {
                tracing::error!("Database error: {}", err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
