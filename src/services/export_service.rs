//! CSV rendering for attendance and employee exports.
//!
//! Fields are quoted per RFC 4180 when they contain a comma, quote, CR or LF.
//! Rows end with CRLF.

use chrono::NaiveDate;

use crate::models::{attendance::AttendanceRecord, employee::Employee};

const ATTENDANCE_HEADER: [&str; 10] = [
    "Employee Name",
    "Employee Code",
    "Department",
    "Date",
    "Morning In",
    "Lunch Out",
    "Afternoon In",
    "Time Out",
    "Status",
    "Verification Method",
];

const EMPLOYEE_HEADER: [&str; 17] = [
    "Employee Code",
    "Full Name",
    "Department",
    "Position",
    "Status",
    "Employment Status",
    "Gender",
    "Civil Status",
    "Date of Birth",
    "Age",
    "Contact Number",
    "Email",
    "Address",
    "Salary Grade",
    "Basic Salary",
    "Date Appointed",
    "Created At",
];

pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line = fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

pub fn attendance_csv(records: &[AttendanceRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, &ATTENDANCE_HEADER);
    for r in records {
        push_row(
            &mut out,
            &[
                r.full_name.as_str(),
                r.employee_code.as_str(),
                r.department.as_str(),
                r.date.as_str(),
                r.morning_in.as_deref().unwrap_or_default(),
                r.lunch_out.as_deref().unwrap_or_default(),
                r.afternoon_in.as_deref().unwrap_or_default(),
                r.time_out.as_deref().unwrap_or_default(),
                r.attendance_status.as_str(),
                r.verification_method.as_str(),
            ],
        );
    }
    out
}

pub fn employees_csv(employees: &[Employee]) -> String {
    let mut out = String::new();
    push_row(&mut out, &EMPLOYEE_HEADER);
    for e in employees {
        let f = &e.fields;
        push_row(
            &mut out,
            &[
                f.employee_code.clone(),
                f.full_name.clone(),
                f.department.clone(),
                f.position.clone(),
                f.status.clone(),
                f.employment_status.clone(),
                f.gender.clone(),
                f.civil_status.clone(),
                f.date_of_birth.clone().unwrap_or_default(),
                f.age.map(|a| a.to_string()).unwrap_or_default(),
                f.contact_number.clone(),
                f.email.clone(),
                f.address.clone(),
                f.salary_grade.clone(),
                f.basic_salary.map(|s| format!("{s:.2}")).unwrap_or_default(),
                f.date_appointed.clone().unwrap_or_default(),
                e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        );
    }
    out
}

/// `attendance_<date|all>_<YYYYMMDD>.csv`
pub fn attendance_filename(date: Option<&str>, today: NaiveDate) -> String {
    format!(
        "attendance_{}_{}.csv",
        date.unwrap_or("all"),
        today.format("%Y%m%d")
    )
}

/// `employees_<YYYYMMDD>.csv`
pub fn employees_filename(today: NaiveDate) -> String {
    format!("employees_{}.csv", today.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::EmployeeFields;

    #[test]
    fn quoting_follows_rfc4180() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("Dela Cruz, Juan"), "\"Dela Cruz, Juan\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn attendance_rows() {
        let record = AttendanceRecord {
            attendance_id: 1,
            employee_id: 1,
            full_name: "Dela Cruz, Juan".to_string(),
            employee_code: "EMP-001".to_string(),
            department: "Finance".to_string(),
            date: "2026-10-19".to_string(),
            morning_in: Some("08:15 AM".to_string()),
            lunch_out: None,
            afternoon_in: None,
            time_out: None,
            attendance_status: "Late".to_string(),
            verification_method: "Face Recognition".to_string(),
        };
        let csv = attendance_csv(&[record]);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert!(lines[0].starts_with("Employee Name,Employee Code,"));
        assert_eq!(
            lines[1],
            "\"Dela Cruz, Juan\",EMP-001,Finance,2026-10-19,08:15 AM,,,,Late,Face Recognition"
        );
        assert_eq!(lines[2], "");
    }

    #[test]
    fn employee_rows() {
        let employee = Employee {
            id: 1,
            fields: EmployeeFields {
                full_name: "Ana Santos".to_string(),
                employee_code: "EMP-002".to_string(),
                age: Some(30),
                basic_salary: Some(25000.0),
                status: "Active".to_string(),
                ..Default::default()
            },
            created_at: NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
        };
        let csv = employees_csv(&[employee]);
        let row = csv.split("\r\n").nth(1).unwrap();
        assert!(row.starts_with("EMP-002,Ana Santos,,,Active,"), "{row}");
        assert!(row.contains(",30,"), "{row}");
        assert!(row.contains(",25000.00,"), "{row}");
        assert!(row.ends_with(",2026-01-02 03:04:05"), "{row}");
    }

    #[test]
    fn filenames() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            attendance_filename(Some("2026-10-01"), today),
            "attendance_2026-10-01_20261019.csv"
        );
        assert_eq!(attendance_filename(None, today), "attendance_all_20261019.csv");
        assert_eq!(employees_filename(today), "employees_20261019.csv");
    }
}
