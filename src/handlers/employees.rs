//! HTTP handlers for the employee registry.
//!
//! This module provides endpoints to register, search, edit and delete
//! employees, and to enroll their face descriptor.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use crate::{
    app::AppState,
    error::AppError,
    models::{
        employee::{Employee, EmployeeInput, EmployeeSearch, EmployeeSummary},
        face::EnrollFaceRequest,
    },
    services::{employee_service, face_service},
};

/// List employees, optionally filtered by `?search=`.
pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<EmployeeSearch>,
) -> Result<Json<Vec<EmployeeSummary>>, AppError> {
    let employees = employee_service::list(&state.pool, query.search.as_deref()).await?;
    Ok(Json(employees))
}

/// Register a new employee.
///
/// # Request Body
///
/// See [`EmployeeInput`]. `full_name` and `employee_code` are required;
/// `face_encodings` optionally enrolls the face in the same call.
///
/// # Response
///
/// Returns 201 Created with the stored employee.
///
/// # Errors
///
/// - 400 listing every invalid field
/// - 409 when the employee code is already used
pub async fn create_employee(
    State(state): State<AppState>,
    Json(input): Json<EmployeeInput>,
) -> Result<impl IntoResponse, AppError> {
    let fields = input.validate()?;
    let employee =
        employee_service::register(&state.pool, &state.faces, &fields, &input.face_encodings)
            .await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Employee>, AppError> {
    Ok(Json(employee_service::get(&state.pool, id).await?))
}

/// Replace an employee's details. The face descriptor is left untouched.
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<EmployeeInput>,
) -> Result<Json<Employee>, AppError> {
    let fields = input.validate()?;
    let employee = employee_service::update(&state.pool, id, &fields).await?;
    Ok(Json(employee))
}

/// Delete an employee along with their face and attendance records.
///
/// Returns 204 No Content on success.
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    employee_service::delete(&state.pool, &state.faces, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Enroll or replace an employee's face.
///
/// # Request Body
///
/// ```json
/// { "encodings": [[0.01, ...], [0.02, ...]] }
/// ```
///
/// Several samples are averaged into one descriptor.
pub async fn enroll_face(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<EnrollFaceRequest>,
) -> Result<Json<Value>, AppError> {
    face_service::enroll(&state.pool, &state.faces, id, &request.encodings).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Face registered successfully"
    })))
}
