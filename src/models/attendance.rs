//! Attendance (daily time record) models and API request/response types.
//!
//! A day has four punches: morning in, lunch out, afternoon in and time out.
//! Times are stored as text in `HH:MM AM/PM` form.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Attendance status of one employee for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Absent => "Absent",
        }
    }

    pub fn late_if(late: bool) -> Self {
        if late {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents an attendance row from the database.
///
/// # Database Table
///
/// Maps to the `attendance` table; `(employee_id, date)` is unique.
#[derive(Debug, Clone, Default, sqlx::FromRow, Serialize)]
pub struct Attendance {
    pub attendance_id: i64,
    pub employee_id: i64,
    /// `YYYY-MM-DD`
    pub date: String,
    pub morning_in: Option<String>,
    pub lunch_out: Option<String>,
    pub afternoon_in: Option<String>,
    pub time_out: Option<String>,
    pub attendance_status: String,
    /// `Face Recognition`, or `Admin: <reason>` for marked days
    pub verification_method: String,
}

/// Attendance row joined with the employee's identity.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AttendanceRecord {
    pub attendance_id: i64,
    pub employee_id: i64,
    pub full_name: String,
    pub employee_code: String,
    pub department: String,
    pub date: String,
    pub morning_in: Option<String>,
    pub lunch_out: Option<String>,
    pub afternoon_in: Option<String>,
    pub time_out: Option<String>,
    pub attendance_status: String,
    pub verification_method: String,
}

/// Response body for a successful face scan.
///
/// ```json
/// {
///   "success": true,
///   "employee": { "id": 1, "full_name": "Juan Dela Cruz", "employee_code": "EMP-001" },
///   "time_in": "08:15 AM",
///   "message": "Good morning! Time in recorded at 08:15 AM (Late)"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct RecognitionResponse {
    pub success: bool,
    pub employee: crate::models::employee::MatchedEmployee,
    pub time_in: String,
    pub message: String,
}

/// Request body for `PUT /api/attendance/{id}`.
///
/// Empty or missing times clear the punch.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAttendanceRequest {
    pub date: Option<String>,
    pub morning_in: Option<String>,
    pub lunch_out: Option<String>,
    pub afternoon_in: Option<String>,
    pub time_out: Option<String>,
}

/// Why a whole day is marked present for everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Holiday,
    Suspension,
}

impl DayKind {
    pub fn default_reason(&self) -> &'static str {
        match self {
            DayKind::Holiday => "Holiday",
            DayKind::Suspension => "Suspension",
        }
    }
}

/// Request body for `POST /api/attendance/mark-day`.
#[derive(Debug, Deserialize)]
pub struct MarkDayRequest {
    pub date: String,
    pub kind: DayKind,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkDayResponse {
    pub success: bool,
    pub marked: u64,
    pub message: String,
}

/// Query string carrying an optional `YYYY-MM-DD` date.
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DateRecordsResponse {
    pub success: bool,
    pub selected_date: String,
    pub records: Vec<AttendanceRecord>,
}

/// Dashboard counters for today plus the latest activity.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub success: bool,
    pub total_employees: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub recent_attendance: Vec<AttendanceRecord>,
}

/// History window for `GET /api/attendance-history`.
///
/// Any value other than `week` selects the month window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    Week,
    #[serde(other)]
    Month,
}

impl HistoryFilter {
    pub fn days(&self) -> i64 {
        match self {
            HistoryFilter::Week => 7,
            HistoryFilter::Month => 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub filter: HistoryFilter,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    /// e.g. `Today, Oct 19, 2026 (Juan Dela Cruz)`
    pub date_label: String,
    pub date: String,
    pub morning_in: Option<String>,
    pub lunch_out: Option<String>,
    pub afternoon_in: Option<String>,
    pub time_out: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub records: Vec<HistoryEntry>,
}

/// Query string for `GET /api/reports/dtr`.
#[derive(Debug, Deserialize)]
pub struct DtrQuery {
    pub employee_id: i64,
    /// `YYYY-MM`
    pub month: String,
}

/// One day in a monthly DTR; missing punches are empty strings.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct DtrDay {
    pub morning_in: String,
    pub lunch_out: String,
    pub afternoon_in: String,
    pub time_out: String,
    pub status: String,
}

/// Monthly daily time record for one employee, keyed by two-digit day.
#[derive(Debug, Serialize)]
pub struct DtrReport {
    pub employee: crate::models::employee::Employee,
    pub year: String,
    pub month: String,
    pub records: BTreeMap<String, DtrDay>,
}
