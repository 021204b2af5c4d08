//! Attendance service - Core business logic for the daily time record.
//!
//! This service handles:
//! - Deciding which punch a face scan records (`next_punch`)
//! - Applying punches atomically
//! - Admin corrections and whole-day markings
//! - Dashboard, history and monthly DTR queries
//!
//! # Punch Order
//!
//! Morning scans fill morning in, then lunch out, then afternoon in, then time
//! out. Scans at or after the afternoon start fill afternoon in, then time out.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    config::AttendanceWindows,
    db::{self, DbPool},
    error::{AppError, conflict_on_unique},
    models::{
        attendance::{
            Attendance, AttendanceRecord, AttendanceStatus, DashboardStats, DayKind, DtrDay,
            DtrReport, HistoryEntry, HistoryFilter, UpdateAttendanceRequest,
        },
        employee::{ACTIVE_STATUS, Employee},
    },
    validation::{self, TIME_FORMAT},
};

/// Verification method stored for scans.
pub const FACE_VERIFICATION: &str = "Face Recognition";

/// Punch times written for holidays and suspensions.
const FULL_DAY: [&str; 4] = ["08:00 AM", "12:00 PM", "01:00 PM", "05:00 PM"];

/// Rows returned by an unfiltered attendance export.
pub const EXPORT_LIMIT: i64 = 1000;

const RECORD_SELECT: &str = r#"
    SELECT a.attendance_id, a.employee_id, e.full_name, e.employee_code, e.department,
           a.date, a.morning_in, a.lunch_out, a.afternoon_in, a.time_out,
           a.attendance_status, a.verification_method
    FROM attendance a
    JOIN employees e ON a.employee_id = e.id
"#;

/// The punch a scan will record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punch {
    MorningIn { late: bool },
    LunchOut,
    AfternoonIn { late: bool, status: AttendanceStatus },
    TimeOut,
    /// All four punches are already recorded
    Complete,
}

impl Punch {
    /// Message shown to the employee after the scan.
    pub fn message(&self, time: &str) -> String {
        let late_suffix = |late: bool| if late { " (Late)" } else { "" };
        match self {
            Punch::MorningIn { late } => {
                format!("Good morning! Time in recorded at {time}{}", late_suffix(*late))
            }
            Punch::LunchOut => format!("Lunch break recorded at {time}"),
            Punch::AfternoonIn { late, .. } => {
                format!("Afternoon time in recorded at {time}{}", late_suffix(*late))
            }
            Punch::TimeOut => format!("Time out recorded at {time}. Have a great day!"),
            Punch::Complete => {
                format!("All attendance records for today are complete. Last update: {time}")
            }
        }
    }
}

impl AttendanceWindows {
    pub fn is_late_morning(&self, t: NaiveTime) -> bool {
        t >= self.morning_late
    }

    pub fn is_late_afternoon(&self, t: NaiveTime) -> bool {
        t >= self.afternoon_late
    }

    pub fn morning_time_in_allowed(&self, t: NaiveTime) -> bool {
        t >= self.morning_min
    }

    pub fn is_afternoon(&self, t: NaiveTime) -> bool {
        t >= self.afternoon_start
    }
}

pub fn format_time(t: NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT).ok()
}

/// Whether a stored morning time-in was late. Unparseable values are not late.
fn stored_morning_late(value: Option<&str>, windows: &AttendanceWindows) -> bool {
    value
        .and_then(parse_time)
        .is_some_and(|t| windows.is_late_morning(t))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn morning_in(now: NaiveTime, windows: &AttendanceWindows) -> Result<Punch, AppError> {
    if !windows.morning_time_in_allowed(now) {
        return Err(AppError::TimeNotAllowed(format!(
            "Morning time-in is allowed from {} onwards. Current time: {}",
            format_time(windows.morning_min),
            format_time(now)
        )));
    }
    Ok(Punch::MorningIn {
        late: windows.is_late_morning(now),
    })
}

fn afternoon_in(existing: Option<&Attendance>, now: NaiveTime, windows: &AttendanceWindows) -> Punch {
    let late = windows.is_late_afternoon(now);
    let morning_was_late =
        existing.is_some_and(|a| stored_morning_late(a.morning_in.as_deref(), windows));
    Punch::AfternoonIn {
        late,
        status: AttendanceStatus::late_if(late || morning_was_late),
    }
}

/// Decide which punch a scan at `now` records, given today's row.
pub fn next_punch(
    existing: Option<&Attendance>,
    now: NaiveTime,
    windows: &AttendanceWindows,
) -> Result<Punch, AppError> {
    let Some(record) = existing else {
        return if windows.is_afternoon(now) {
            Ok(afternoon_in(None, now, windows))
        } else {
            morning_in(now, windows)
        };
    };

    if windows.is_afternoon(now) {
        return Ok(if is_blank(&record.afternoon_in) {
            afternoon_in(existing, now, windows)
        } else if is_blank(&record.time_out) {
            Punch::TimeOut
        } else {
            Punch::Complete
        });
    }

    if is_blank(&record.morning_in) {
        morning_in(now, windows)
    } else if is_blank(&record.lunch_out) {
        Ok(Punch::LunchOut)
    } else if is_blank(&record.afternoon_in) {
        Ok(afternoon_in(existing, now, windows))
    } else if is_blank(&record.time_out) {
        Ok(Punch::TimeOut)
    } else {
        Ok(Punch::Complete)
    }
}

/// Record the next punch for `employee_id` at `now`.
///
/// # Process
///
/// 1. Start a transaction and load today's row
/// 2. Decide the punch with [`next_punch`]
/// 3. Insert today's row or update the punched column
/// 4. Commit
///
/// Returns the punch and the formatted time. The whole transaction is
/// retried when SQLite reports the database as busy.
pub async fn record_punch(
    pool: &DbPool,
    employee_id: i64,
    now: NaiveDateTime,
    windows: &AttendanceWindows,
) -> Result<(Punch, String), AppError> {
    db::retry_on_busy(|| apply_punch(pool, employee_id, now, windows)).await?
}

/// Outer error: database failures worth retrying. Inner error: the punch was refused.
async fn apply_punch(
    pool: &DbPool,
    employee_id: i64,
    now: NaiveDateTime,
    windows: &AttendanceWindows,
) -> Result<Result<(Punch, String), AppError>, sqlx::Error> {
    let date = now.date().format("%Y-%m-%d").to_string();
    let time = format_time(now.time());

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date = ?",
    )
    .bind(employee_id)
    .bind(&date)
    .fetch_optional(&mut *tx)
    .await?;

    let punch = match next_punch(existing.as_ref(), now.time(), windows) {
        Ok(punch) => punch,
        Err(refused) => return Ok(Err(refused)),
    };

    let (column, status) = match punch {
        Punch::MorningIn { late } => ("morning_in", Some(AttendanceStatus::late_if(late))),
        Punch::AfternoonIn { status, .. } => ("afternoon_in", Some(status)),
        Punch::LunchOut => ("lunch_out", None),
        Punch::TimeOut => ("time_out", None),
        Punch::Complete => {
            tx.rollback().await?;
            return Ok(Ok((punch, time)));
        }
    };

    match (&existing, status) {
        (Some(record), Some(status)) => {
            sqlx::query(&format!(
                "UPDATE attendance SET {column} = ?, attendance_status = ? WHERE attendance_id = ?"
            ))
            .bind(&time)
            .bind(status.as_str())
            .bind(record.attendance_id)
            .execute(&mut *tx)
            .await?;
        }
        (Some(record), None) => {
            sqlx::query(&format!(
                "UPDATE attendance SET {column} = ? WHERE attendance_id = ?"
            ))
            .bind(&time)
            .bind(record.attendance_id)
            .execute(&mut *tx)
            .await?;
        }
        (None, status) => {
            let status = status.unwrap_or(AttendanceStatus::Present);
            sqlx::query(&format!(
                "INSERT INTO attendance (employee_id, date, {column}, attendance_status, verification_method) VALUES (?, ?, ?, ?, ?)"
            ))
            .bind(employee_id)
            .bind(&date)
            .bind(&time)
            .bind(status.as_str())
            .bind(FACE_VERIFICATION)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    tracing::info!("Attendance recorded for employee {} at {}", employee_id, time);

    Ok(Ok((punch, time)))
}

/// Apply an admin correction to one attendance row.
///
/// The status is recomputed from the corrected times.
pub async fn update_record(
    pool: &DbPool,
    attendance_id: i64,
    request: &UpdateAttendanceRequest,
    windows: &AttendanceWindows,
) -> Result<Attendance, AppError> {
    let mut errors = validation::Errors::default();
    let date = errors.check(
        validation::required(request.date.as_deref(), "Date")
            .and_then(|d| validation::date(Some(&d), "Date")),
    );
    let morning_in = errors.check(validation::time(request.morning_in.as_deref(), "Morning In"));
    let lunch_out = errors.check(validation::time(request.lunch_out.as_deref(), "Lunch Out"));
    let afternoon_in =
        errors.check(validation::time(request.afternoon_in.as_deref(), "Afternoon In"));
    let time_out = errors.check(validation::time(request.time_out.as_deref(), "Time Out"));
    errors.into_result().map_err(AppError::InvalidRequest)?;

    let late = morning_in
        .as_deref()
        .and_then(parse_time)
        .is_some_and(|t| windows.is_late_morning(t))
        || afternoon_in
            .as_deref()
            .and_then(parse_time)
            .is_some_and(|t| windows.is_late_afternoon(t));
    let status = AttendanceStatus::late_if(late);

    let updated = sqlx::query_as::<_, Attendance>(
        r#"
        UPDATE attendance
        SET morning_in = ?, lunch_out = ?, afternoon_in = ?, time_out = ?,
            attendance_status = ?, date = ?
        WHERE attendance_id = ?
        RETURNING *
        "#,
    )
    .bind(morning_in)
    .bind(lunch_out)
    .bind(afternoon_in)
    .bind(time_out)
    .bind(status.as_str())
    .bind(date)
    .bind(attendance_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "This employee already has a record for that date"))?
    .ok_or(AppError::AttendanceNotFound)?;

    tracing::info!("DTR {} updated successfully", attendance_id);
    Ok(updated)
}

/// Mark every active employee present for a full day.
///
/// Existing rows for that date are overwritten. Returns the number of
/// employees marked.
pub async fn mark_day(
    pool: &DbPool,
    date: &str,
    kind: DayKind,
    reason: Option<&str>,
) -> Result<u64, AppError> {
    let date = validation::required(Some(date), "Date")
        .and_then(|d| validation::date(Some(&d), "Date"))
        .map_err(AppError::InvalidRequest)?
        .unwrap_or_default();

    let reason = match validation::sanitize(reason, 200) {
        r if r.is_empty() => kind.default_reason().to_string(),
        r => r,
    };
    let verification = format!("Admin: {reason}");

    let mut tx = pool.begin().await?;

    let active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE status = ?")
        .bind(ACTIVE_STATUS)
        .fetch_one(&mut *tx)
        .await?;
    if active == 0 {
        tx.rollback().await?;
        return Err(AppError::InvalidRequest(
            "No active employees found".to_string(),
        ));
    }

    let marked = sqlx::query(
        r#"
        INSERT INTO attendance (
            employee_id, date, morning_in, lunch_out, afternoon_in, time_out,
            attendance_status, verification_method
        )
        SELECT id, ?, ?, ?, ?, ?, 'Present', ? FROM employees WHERE status = ?
        ON CONFLICT(employee_id, date) DO UPDATE SET
            morning_in = excluded.morning_in,
            lunch_out = excluded.lunch_out,
            afternoon_in = excluded.afternoon_in,
            time_out = excluded.time_out,
            attendance_status = excluded.attendance_status,
            verification_method = excluded.verification_method
        "#,
    )
    .bind(&date)
    .bind(FULL_DAY[0])
    .bind(FULL_DAY[1])
    .bind(FULL_DAY[2])
    .bind(FULL_DAY[3])
    .bind(&verification)
    .bind(ACTIVE_STATUS)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;
    tracing::info!(
        "{:?} marked for {} employees on {} ({})",
        kind,
        marked,
        date,
        reason
    );

    Ok(marked)
}

/// Counters for `today` and the ten latest records.
pub async fn dashboard_stats(pool: &DbPool, today: NaiveDate) -> Result<DashboardStats, AppError> {
    let today = today.format("%Y-%m-%d").to_string();

    let (total_employees, present, absent, late): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM employees),
            (SELECT COUNT(*) FROM attendance WHERE date = ?1 AND attendance_status = 'Present'),
            (SELECT COUNT(*) FROM attendance WHERE date = ?1 AND attendance_status = 'Absent'),
            (SELECT COUNT(*) FROM attendance WHERE date = ?1 AND attendance_status = 'Late')
        "#,
    )
    .bind(&today)
    .fetch_one(pool)
    .await?;

    let recent_attendance = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "{RECORD_SELECT} ORDER BY a.date DESC, a.attendance_id DESC LIMIT 10"
    ))
    .fetch_all(pool)
    .await?;

    Ok(DashboardStats {
        success: true,
        total_employees,
        present,
        absent,
        late,
        recent_attendance,
    })
}

/// All records for one date, ordered by employee name.
pub async fn records_for_date(pool: &DbPool, date: &str) -> Result<Vec<AttendanceRecord>, AppError> {
    let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "{RECORD_SELECT} WHERE a.date = ? ORDER BY e.full_name"
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Rows for the attendance CSV export.
pub async fn export_records(
    pool: &DbPool,
    date: Option<&str>,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let records = match date {
        Some(date) => {
            sqlx::query_as::<_, AttendanceRecord>(&format!(
                "{RECORD_SELECT} WHERE a.date = ? ORDER BY e.full_name, a.date"
            ))
            .bind(date)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, AttendanceRecord>(&format!(
                "{RECORD_SELECT} ORDER BY a.date DESC, e.full_name LIMIT ?"
            ))
            .bind(EXPORT_LIMIT)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(records)
}

/// Human label for a history row relative to `today`.
pub fn history_label(date: NaiveDate, name: &str, today: NaiveDate) -> String {
    let formatted = date.format("%b %d, %Y");
    if date == today {
        format!("Today, {formatted} ({name})")
    } else if date == today - Duration::days(1) {
        format!("Yesterday, {formatted} ({name})")
    } else {
        format!("{formatted} ({name})")
    }
}

/// Recent records across all employees, newest first, at most 50.
pub async fn history(
    pool: &DbPool,
    filter: HistoryFilter,
    today: NaiveDate,
) -> Result<Vec<HistoryEntry>, AppError> {
    let start = (today - Duration::days(filter.days()))
        .format("%Y-%m-%d")
        .to_string();

    let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "{RECORD_SELECT} WHERE a.date >= ? ORDER BY a.date DESC, e.full_name LIMIT 50"
    ))
    .bind(start)
    .fetch_all(pool)
    .await?;

    let entries = records
        .into_iter()
        .map(|r| {
            let date_label = match NaiveDate::parse_from_str(&r.date, "%Y-%m-%d") {
                Ok(date) => history_label(date, &r.full_name, today),
                Err(_) => format!("{} ({})", r.date, r.full_name),
            };
            HistoryEntry {
                date_label,
                date: r.date,
                morning_in: r.morning_in,
                lunch_out: r.lunch_out,
                afternoon_in: r.afternoon_in,
                time_out: r.time_out,
                status: r.attendance_status,
            }
        })
        .collect();

    Ok(entries)
}

/// Monthly daily time record for one employee. `month` is `YYYY-MM`.
pub async fn monthly_dtr(pool: &DbPool, employee_id: i64, month: &str) -> Result<DtrReport, AppError> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidRequest("Month must be in format YYYY-MM".to_string()))?;
    let year = first.format("%Y").to_string();
    let month = first.format("%m").to_string();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::EmployeeNotFound)?;

    let rows = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date LIKE ? ORDER BY date",
    )
    .bind(employee_id)
    .bind(format!("{year}-{month}-%"))
    .fetch_all(pool)
    .await?;

    let records: BTreeMap<String, DtrDay> = rows
        .into_iter()
        .filter_map(|row| {
            let day = row.date.get(8..10)?.to_string();
            Some((
                day,
                DtrDay {
                    morning_in: row.morning_in.unwrap_or_default(),
                    lunch_out: row.lunch_out.unwrap_or_default(),
                    afternoon_in: row.afternoon_in.unwrap_or_default(),
                    time_out: row.time_out.unwrap_or_default(),
                    status: row.attendance_status,
                },
            ))
        })
        .collect();

    Ok(DtrReport {
        employee,
        year,
        month,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn row(morning: Option<&str>, lunch: Option<&str>, afternoon: Option<&str>, out: Option<&str>) -> Attendance {
        Attendance {
            morning_in: morning.map(String::from),
            lunch_out: lunch.map(String::from),
            afternoon_in: afternoon.map(String::from),
            time_out: out.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn first_morning_scan_is_time_in() {
        let w = AttendanceWindows::default();
        assert_eq!(
            next_punch(None, t(7, 45), &w).unwrap(),
            Punch::MorningIn { late: false }
        );
        assert_eq!(
            next_punch(None, t(8, 0), &w).unwrap(),
            Punch::MorningIn { late: false }
        );
        assert_eq!(
            next_punch(None, t(8, 1), &w).unwrap(),
            Punch::MorningIn { late: true }
        );
    }

    #[test]
    fn morning_scan_before_minimum_is_refused() {
        let w = AttendanceWindows::default();
        let err = next_punch(None, t(4, 59), &w).unwrap_err();
        let AppError::TimeNotAllowed(msg) = err else {
            panic!("expected time window error");
        };
        assert!(msg.contains("05:00 AM"), "{msg}");
        assert!(msg.contains("04:59 AM"), "{msg}");
        assert!(next_punch(None, t(5, 0), &w).is_ok());
    }

    #[test]
    fn first_afternoon_scan_is_afternoon_in() {
        let w = AttendanceWindows::default();
        assert_eq!(
            next_punch(None, t(12, 30), &w).unwrap(),
            Punch::AfternoonIn {
                late: false,
                status: AttendanceStatus::Present
            }
        );
        assert_eq!(
            next_punch(None, t(13, 1), &w).unwrap(),
            Punch::AfternoonIn {
                late: true,
                status: AttendanceStatus::Late
            }
        );
    }

    #[test]
    fn morning_sequence_fills_slots_in_order() {
        let w = AttendanceWindows::default();
        let r = row(Some("07:55 AM"), None, None, None);
        assert_eq!(next_punch(Some(&r), t(11, 0), &w).unwrap(), Punch::LunchOut);

        let r = row(Some("07:55 AM"), Some("11:00 AM"), None, None);
        assert_eq!(
            next_punch(Some(&r), t(11, 50), &w).unwrap(),
            Punch::AfternoonIn {
                late: false,
                status: AttendanceStatus::Present
            }
        );

        let r = row(Some("07:55 AM"), Some("11:00 AM"), Some("11:50 AM"), None);
        assert_eq!(next_punch(Some(&r), t(11, 55), &w).unwrap(), Punch::TimeOut);

        let r = row(Some("07:55 AM"), Some("11:00 AM"), Some("11:50 AM"), Some("11:55 AM"));
        assert_eq!(next_punch(Some(&r), t(11, 58), &w).unwrap(), Punch::Complete);
    }

    #[test]
    fn late_morning_carries_into_afternoon_status() {
        let w = AttendanceWindows::default();
        let r = row(Some("08:30 AM"), Some("12:00 PM"), None, None);
        assert_eq!(
            next_punch(Some(&r), t(12, 50), &w).unwrap(),
            Punch::AfternoonIn {
                late: false,
                status: AttendanceStatus::Late
            }
        );
    }

    #[test]
    fn afternoon_sequence() {
        let w = AttendanceWindows::default();
        let r = row(Some("07:55 AM"), None, Some("12:40 PM"), None);
        assert_eq!(next_punch(Some(&r), t(17, 0), &w).unwrap(), Punch::TimeOut);

        let r = row(Some("07:55 AM"), None, Some("12:40 PM"), Some("05:00 PM"));
        assert_eq!(next_punch(Some(&r), t(17, 5), &w).unwrap(), Punch::Complete);
    }

    #[test]
    fn messages() {
        assert_eq!(
            Punch::MorningIn { late: true }.message("08:15 AM"),
            "Good morning! Time in recorded at 08:15 AM (Late)"
        );
        assert_eq!(
            Punch::TimeOut.message("05:00 PM"),
            "Time out recorded at 05:00 PM. Have a great day!"
        );
        assert_eq!(
            Punch::Complete.message("05:10 PM"),
            "All attendance records for today are complete. Last update: 05:10 PM"
        );
    }

    #[test]
    fn history_labels() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            history_label(today, "Ann Lee", today),
            "Today, Oct 19, 2026 (Ann Lee)"
        );
        assert_eq!(
            history_label(today - Duration::days(1), "Ann Lee", today),
            "Yesterday, Oct 18, 2026 (Ann Lee)"
        );
        assert_eq!(
            history_label(today - Duration::days(5), "Ann Lee", today),
            "Oct 14, 2026 (Ann Lee)"
        );
    }

    async fn seeded_pool() -> DbPool {
        let pool = crate::db::create_memory_pool().await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO employees (full_name, employee_code, status) VALUES ('Ann Lee', 'E-001', 'Active'), ('Bo Diaz', 'E-002', 'Inactive')",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    fn at(date: &str, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(t(h, m))
    }

    #[tokio::test]
    async fn full_day_of_punches() {
        let pool = seeded_pool().await;
        let w = AttendanceWindows::default();

        for (h, m) in [(7, 58), (12, 0), (17, 2)] {
            record_punch(&pool, 1, at("2026-10-19", h, m), &w).await.unwrap();
        }

        let row = sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE employee_id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.date, "2026-10-19");
        assert_eq!(row.morning_in.as_deref(), Some("07:58 AM"));
        assert_eq!(row.lunch_out, None);
        assert_eq!(row.afternoon_in.as_deref(), Some("12:00 PM"));
        assert_eq!(row.time_out.as_deref(), Some("05:02 PM"));
        assert_eq!(row.attendance_status, "Present");
        assert_eq!(row.verification_method, FACE_VERIFICATION);

        let (punch, _) = record_punch(&pool, 1, at("2026-10-19", 17, 30), &w).await.unwrap();
        assert_eq!(punch, Punch::Complete);
    }

    #[tokio::test]
    async fn mark_day_upserts_active_employees_only() {
        let pool = seeded_pool().await;
        let w = AttendanceWindows::default();
        record_punch(&pool, 1, at("2026-12-25", 9, 0), &w).await.unwrap();

        let marked = mark_day(&pool, "2026-12-25", DayKind::Holiday, None).await.unwrap();
        assert_eq!(marked, 1);

        let rows = records_for_date(&pool, "2026-12-25").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].morning_in.as_deref(), Some("08:00 AM"));
        assert_eq!(rows[0].time_out.as_deref(), Some("05:00 PM"));
        assert_eq!(rows[0].attendance_status, "Present");
        assert_eq!(rows[0].verification_method, "Admin: Holiday");
    }

    #[tokio::test]
    async fn update_record_recomputes_status() {
        let pool = seeded_pool().await;
        let w = AttendanceWindows::default();
        record_punch(&pool, 1, at("2026-10-19", 7, 30), &w).await.unwrap();

        let request = UpdateAttendanceRequest {
            date: Some("2026-10-19".to_string()),
            morning_in: Some("08:20 AM".to_string()),
            ..Default::default()
        };
        let updated = update_record(&pool, 1, &request, &w).await.unwrap();
        assert_eq!(updated.attendance_status, "Late");
        assert_eq!(updated.morning_in.as_deref(), Some("08:20 AM"));

        let missing = update_record(&pool, 42, &request, &w).await.unwrap_err();
        assert!(matches!(missing, AppError::AttendanceNotFound));

        let bad = UpdateAttendanceRequest {
            date: None,
            morning_in: Some("25:00".to_string()),
            ..Default::default()
        };
        let AppError::InvalidRequest(msg) = update_record(&pool, 1, &bad, &w).await.unwrap_err()
        else {
            panic!("expected validation error");
        };
        assert!(msg.contains("Date is required"), "{msg}");
        assert!(msg.contains("Morning In"), "{msg}");
    }

    #[tokio::test]
    async fn monthly_dtr_keys_by_day() {
        let pool = seeded_pool().await;
        let w = AttendanceWindows::default();
        record_punch(&pool, 1, at("2026-10-01", 7, 30), &w).await.unwrap();
        record_punch(&pool, 1, at("2026-10-02", 13, 30), &w).await.unwrap();
        record_punch(&pool, 1, at("2026-11-01", 7, 30), &w).await.unwrap();

        let report = monthly_dtr(&pool, 1, "2026-10").await.unwrap();
        assert_eq!(report.year, "2026");
        assert_eq!(report.month, "10");
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records["01"].morning_in, "07:30 AM");
        assert_eq!(report.records["02"].afternoon_in, "01:30 PM");
        assert_eq!(report.records["02"].status, "Late");

        assert!(matches!(
            monthly_dtr(&pool, 1, "October").await.unwrap_err(),
            AppError::InvalidRequest(_)
        ));
        assert!(matches!(
            monthly_dtr(&pool, 9, "2026-10").await.unwrap_err(),
            AppError::EmployeeNotFound
        ));
    }

    #[tokio::test]
    async fn dashboard_counts_today() {
        let pool = seeded_pool().await;
        let w = AttendanceWindows::default();
        record_punch(&pool, 1, at("2026-10-19", 8, 30), &w).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let stats = dashboard_stats(&pool, today).await.unwrap();
        assert_eq!(stats.total_employees, 2);
        assert_eq!(stats.late, 1);
        assert_eq!(stats.present, 0);
        assert_eq!(stats.recent_attendance.len(), 1);

        let entries = history(&pool, HistoryFilter::Week, today).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date_label, "Today, Oct 19, 2026 (Ann Lee)");
    }
}
