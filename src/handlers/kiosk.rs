//! Public kiosk endpoints: the capture page, face scans and recent history.

use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};

use crate::{
    app::AppState,
    error::AppError,
    models::{
        attendance::{HistoryQuery, HistoryResponse, RecognitionResponse},
        employee::MatchedEmployee,
        face::{FaceEncoding, RecognizeRequest},
    },
    services::{attendance_service, employee_service, face_service},
};

const ATTENDANCE_PAGE: &str = include_str!("../../static/attendance.html");

/// Serve the kiosk page.
///
/// The page computes a face descriptor in the browser and posts it to
/// `/api/recognize-face`.
pub async fn attendance_page() -> Html<&'static str> {
    Html(ATTENDANCE_PAGE)
}

/// Identify a face and record the next punch for that employee.
///
/// # Request Body
///
/// ```json
/// { "encoding": [0.0123, -0.0456, ...] }
/// ```
///
/// `encoding` must hold exactly 128 finite numbers.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "employee": { "id": 1, "full_name": "Juan Dela Cruz", "employee_code": "EMP-001" },
///   "time_in": "07:58 AM",
///   "message": "Good morning! Time in recorded at 07:58 AM"
/// }
/// ```
///
/// # Errors
///
/// - 400 for a malformed descriptor
/// - 422 when nobody is enrolled, the face is not recognized, or a morning
///   time-in comes before the allowed window
/// - 403 when the matched employee is not active
pub async fn recognize_face(
    State(state): State<AppState>,
    Json(request): Json<RecognizeRequest>,
) -> Result<Json<RecognitionResponse>, AppError> {
    let candidate = FaceEncoding::new(request.encoding)?;

    let employee_id = face_service::identify(
        &state.pool,
        &state.faces,
        &candidate,
        state.config.face_tolerance,
    )
    .await?;

    let employee = employee_service::get(&state.pool, employee_id).await?;
    if !employee.is_active() {
        tracing::warn!(
            "Inactive employee attempted attendance: {}",
            employee.fields.full_name
        );
        return Err(AppError::InactiveEmployee);
    }

    let (punch, time) =
        attendance_service::record_punch(&state.pool, employee.id, state.now(), &state.windows)
            .await?;

    Ok(Json(RecognitionResponse {
        success: true,
        employee: MatchedEmployee::from(&employee),
        message: punch.message(&time),
        time_in: time,
    }))
}

/// Recent attendance for the kiosk's history panel.
///
/// `?filter=week` (default) covers 7 days, `?filter=month` covers 30.
pub async fn attendance_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let records =
        attendance_service::history(&state.pool, query.filter, state.now().date()).await?;

    Ok(Json(HistoryResponse {
        success: true,
        records,
    }))
}
