//! CSV download endpoints.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    app::AppState,
    error::AppError,
    models::{attendance::DateQuery, employee::EmployeeSearch},
    services::{attendance_service, employee_service, export_service},
    validation,
};

fn csv_download(filename: String, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

/// Attendance for `?date=YYYY-MM-DD`, or the latest 1000 rows without a date.
pub async fn export_attendance(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let date = validation::date(query.date.as_deref(), "Date").map_err(AppError::InvalidRequest)?;

    let records = attendance_service::export_records(&state.pool, date.as_deref()).await?;
    let filename = export_service::attendance_filename(date.as_deref(), state.now().date());
    tracing::info!("Exported {} attendance records to {}", records.len(), filename);

    Ok(csv_download(filename, export_service::attendance_csv(&records)))
}

/// Employee registry, optionally filtered by `?search=`.
pub async fn export_employees(
    State(state): State<AppState>,
    Query(query): Query<EmployeeSearch>,
) -> Result<impl IntoResponse, AppError> {
    let employees = employee_service::export_rows(&state.pool, query.search.as_deref()).await?;
    let filename = export_service::employees_filename(state.now().date());
    tracing::info!("Exported {} employees to {}", employees.len(), filename);

    Ok(csv_download(filename, export_service::employees_csv(&employees)))
}
