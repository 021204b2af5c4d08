//! Back-office attendance endpoints: dashboard, daily records, corrections,
//! holiday marking and the monthly DTR.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    app::AppState,
    error::AppError,
    models::attendance::{
        Attendance, DashboardStats, DateQuery, DateRecordsResponse, DtrQuery, DtrReport,
        MarkDayRequest, MarkDayResponse, UpdateAttendanceRequest,
    },
    services::attendance_service,
    validation,
};

/// Today's counters and the latest activity.
pub async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = attendance_service::dashboard_stats(&state.pool, state.now().date()).await?;
    Ok(Json(stats))
}

/// Records for `?date=YYYY-MM-DD`, defaulting to today.
pub async fn attendance_records(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DateRecordsResponse>, AppError> {
    let selected_date = validation::date(query.date.as_deref(), "Date")
        .map_err(AppError::InvalidRequest)?
        .unwrap_or_else(|| state.now().date().format("%Y-%m-%d").to_string());

    let records = attendance_service::records_for_date(&state.pool, &selected_date).await?;

    Ok(Json(DateRecordsResponse {
        success: true,
        selected_date,
        records,
    }))
}

/// Correct one attendance row.
///
/// # Request Body
///
/// ```json
/// {
///   "date": "2026-10-19",
///   "morning_in": "08:00 AM",
///   "lunch_out": "12:00 PM",
///   "afternoon_in": "",
///   "time_out": null
/// }
/// ```
///
/// Blank times clear the punch. The status is recomputed from the new times.
pub async fn update_attendance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAttendanceRequest>,
) -> Result<Json<Attendance>, AppError> {
    let record =
        attendance_service::update_record(&state.pool, id, &request, &state.windows).await?;
    Ok(Json(record))
}

/// Mark every active employee present for a holiday or suspension.
///
/// # Request Body
///
/// ```json
/// { "date": "2026-12-25", "kind": "holiday", "reason": "Christmas Day" }
/// ```
pub async fn mark_day(
    State(state): State<AppState>,
    Json(request): Json<MarkDayRequest>,
) -> Result<Json<MarkDayResponse>, AppError> {
    let marked = attendance_service::mark_day(
        &state.pool,
        &request.date,
        request.kind,
        request.reason.as_deref(),
    )
    .await?;

    Ok(Json(MarkDayResponse {
        success: true,
        marked,
        message: format!(
            "{} marked for {} employees on {}",
            request.kind.default_reason(),
            marked,
            request.date.trim()
        ),
    }))
}

/// Monthly daily time record: `?employee_id=1&month=2026-10`.
pub async fn dtr_report(
    State(state): State<AppState>,
    Query(query): Query<DtrQuery>,
) -> Result<Json<DtrReport>, AppError> {
    let report = attendance_service::monthly_dtr(&state.pool, query.employee_id, &query.month).await?;
    Ok(Json(report))
}
