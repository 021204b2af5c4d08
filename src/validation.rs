//! Input validation for employee, admin and attendance data.
//!
//! Each validator returns the normalized value or an error message naming
//! the offending field. Callers collect messages and surface them as
//! [`AppError::InvalidRequest`](crate::error::AppError::InvalidRequest).

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

/// Format of every stored attendance time, e.g. `08:01 AM`.
pub const TIME_FORMAT: &str = "%I:%M %p";

pub type FieldResult<T> = Result<T, String>;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid regex"));
static PHONE_SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-()]").expect("valid regex"));
static EMPLOYEE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_]+$").expect("valid regex"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s'\-,.]+$").expect("valid regex"));
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("valid regex"));

pub fn required(value: Option<&str>, field: &str) -> FieldResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("{field} is required")),
    }
}

pub fn length(value: &str, field: &str, min: usize, max: usize) -> FieldResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min {
        return Err(format!("{field} must be at least {min} characters long"));
    }
    if len > max {
        return Err(format!("{field} must be no more than {max} characters long"));
    }
    Ok(value.to_string())
}

/// Trim and truncate free text. `None` becomes an empty string.
pub fn sanitize(value: Option<&str>, max: usize) -> String {
    value
        .map(|v| v.trim().chars().take(max).collect())
        .unwrap_or_default()
}

/// Optional email, lower-cased.
pub fn email(value: Option<&str>, field: &str) -> FieldResult<String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(String::new());
    };
    let value = value.to_lowercase();
    if value.len() > 255 {
        return Err(format!("{field} is too long (maximum 255 characters)"));
    }
    if !EMAIL_RE.is_match(&value) {
        return Err(format!("{field} has an invalid format"));
    }
    Ok(value)
}

/// Optional phone number; separators are allowed but 7-15 digits must remain.
pub fn phone(value: Option<&str>, field: &str) -> FieldResult<String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(String::new());
    };
    let digits = PHONE_SEPARATORS_RE.replace_all(value, "");
    if !PHONE_RE.is_match(&digits) {
        return Err(format!("{field} has an invalid format"));
    }
    Ok(value.to_string())
}

pub fn integer_in_range(
    value: Option<i64>,
    field: &str,
    min: i64,
    max: i64,
) -> FieldResult<Option<i64>> {
    match value {
        Some(v) if v < min => Err(format!("{field} must be at least {min}")),
        Some(v) if v > max => Err(format!("{field} must be no more than {max}")),
        other => Ok(other),
    }
}

pub fn non_negative(value: Option<f64>, field: &str) -> FieldResult<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(format!("{field} must be a valid number")),
        Some(v) if v < 0.0 => Err(format!("{field} must be at least 0")),
        other => Ok(other),
    }
}

/// Optional `YYYY-MM-DD` date.
pub fn date(value: Option<&str>, field: &str) -> FieldResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|d| Some(d.format("%Y-%m-%d").to_string()))
        .map_err(|_| format!("{field} must be in format YYYY-MM-DD"))
}

/// Optional `HH:MM AM/PM` time, normalized to [`TIME_FORMAT`].
pub fn time(value: Option<&str>, field: &str) -> FieldResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveTime::parse_from_str(&value.to_uppercase(), TIME_FORMAT)
        .map(|t| Some(t.format(TIME_FORMAT).to_string()))
        .map_err(|_| format!("{field} must be in format HH:MM AM/PM (e.g., '08:00 AM')"))
}

/// Employee code: 3-50 characters of letters, digits, `-` and `_`, upper-cased.
pub fn employee_code(value: Option<&str>) -> FieldResult<String> {
    let code = required(value, "Employee Code")?;
    let code = length(&code, "Employee Code", 3, 50)?;
    if !EMPLOYEE_CODE_RE.is_match(&code) {
        return Err(
            "Employee Code can only contain letters, numbers, dashes, and underscores".to_string(),
        );
    }
    Ok(code.to_uppercase())
}

/// Person name: letters, spaces, apostrophes, hyphens, periods and commas.
pub fn name(value: Option<&str>, field: &str) -> FieldResult<String> {
    let name = required(value, field)?;
    let name = length(&name, field, 2, 255)?;
    if !NAME_RE.is_match(&name) {
        return Err(format!(
            "{field} can only contain letters, spaces, apostrophes, hyphens, periods, and commas"
        ));
    }
    Ok(name)
}

/// Username: 3-50 characters of lowercase letters, digits and underscores.
pub fn username(value: Option<&str>) -> FieldResult<String> {
    let username = required(value, "Username")?.to_lowercase();
    let username = length(&username, "Username", 3, 50)?;
    if !USERNAME_RE.is_match(&username) {
        return Err(
            "Username can only contain lowercase letters, numbers, and underscores".to_string(),
        );
    }
    Ok(username)
}

pub fn password(value: Option<&str>, min: usize) -> FieldResult<String> {
    let password = value.unwrap_or_default();
    if password.trim().is_empty() {
        return Err("Password is required".to_string());
    }
    let len = password.chars().count();
    if len < min {
        return Err(format!("Password must be at least {min} characters long"));
    }
    if len > 128 {
        return Err("Password must be no more than 128 characters long".to_string());
    }
    Ok(password.to_string())
}

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Errors(Vec<String>);

impl Errors {
    pub fn check<T: Default>(&mut self, result: FieldResult<T>) -> T {
        result.unwrap_or_else(|msg| {
            self.0.push(msg);
            T::default()
        })
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0.join("; "))
        }
    }
}
