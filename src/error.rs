//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing/expired sessions, bad credentials
/// - **Resource Errors**: Employees, admins or attendance rows not found
/// - **Recognition Errors**: No enrolled faces, unmatched faces, inactive employees
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session token is missing, unknown or expired.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Authentication required")]
    Unauthorized,

    /// Username/password pair did not match an admin account.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Employee not found")]
    EmployeeNotFound,

    #[error("Admin account not found")]
    AdminNotFound,

    #[error("Attendance record not found")]
    AttendanceNotFound,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// A unique value (employee code, username) is already taken.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    Conflict(String),

    /// The face gallery is empty, so nothing can be matched.
    #[error("No registered employees found. Please contact administrator.")]
    NoRegisteredFaces,

    /// The submitted face is too far from every enrolled face.
    ///
    /// Returns HTTP 422 with the best similarity percentage in the message.
    #[error(
        "Face not recognized. Your face doesn't match any registered employee. (Similarity: {similarity:.1}%)"
    )]
    FaceNotRecognized { similarity: f64 },

    /// The matched employee's status is not `Active`.
    #[error("Your account is not active. Please contact administrator.")]
    InactiveEmployee,

    /// The punch falls outside the allowed attendance window.
    #[error("{0}")]
    TimeNotAllowed(String),

    /// Deleting this admin would leave the system without one.
    #[error("Cannot delete the last admin account")]
    LastAdmin,
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// `Database` errors return 500 and hide details from the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::EmployeeNotFound => (StatusCode::NOT_FOUND, "employee_not_found"),
            AppError::AdminNotFound => (StatusCode::NOT_FOUND, "admin_not_found"),
            AppError::AttendanceNotFound => (StatusCode::NOT_FOUND, "attendance_not_found"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::NoRegisteredFaces => {
                (StatusCode::UNPROCESSABLE_ENTITY, "no_registered_faces")
            }
            AppError::FaceNotRecognized { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "face_not_recognized")
            }
            AppError::InactiveEmployee => (StatusCode::FORBIDDEN, "inactive_employee"),
            AppError::TimeNotAllowed(_) => (StatusCode::UNPROCESSABLE_ENTITY, "time_not_allowed"),
            AppError::LastAdmin => (StatusCode::BAD_REQUEST, "last_admin"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self {
            AppError::InvalidRequest(msg) => msg.clone(),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Map a unique-constraint violation to [`AppError::Conflict`], passing every
/// other error through unchanged.
pub fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.into()),
        _ => AppError::Database(err),
    }
}
