//! Employee data models and API request/response types.
//!
//! This module defines:
//! - `Employee`: Database entity representing an employee record
//! - `EmployeeFields`: The validated, storable part of an employee
//! - `EmployeeInput`: Request body for registering or updating employees
//! - `EmployeeSummary`: Compact row for pickers and search results

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, validation};

/// Status an employee must have to record attendance.
pub const ACTIVE_STATUS: &str = "Active";

/// Represents an employee record from the database.
///
/// # Database Table
///
/// Maps to the `employees` table. Deleting an employee cascades to its
/// `facial_data` and `attendance` rows.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Employee {
    pub id: i64,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: EmployeeFields,

    pub created_at: NaiveDateTime,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.fields.status == ACTIVE_STATUS
    }
}

/// Validated employee columns, shared by insert and update.
#[derive(Debug, Clone, Default, sqlx::FromRow, Serialize)]
pub struct EmployeeFields {
    pub full_name: String,
    /// Unique, upper-cased code such as `EMP-001`
    pub employee_code: String,

    // Personal
    pub address: String,
    pub place_of_birth: String,
    pub blood_type: String,
    pub date_of_birth: Option<String>,
    pub gender: String,
    pub civil_status: String,
    pub age: Option<i64>,

    // Contact
    pub contact_number: String,
    pub email: String,

    // Education and government identifiers
    pub course: String,
    pub entity_office: String,
    pub bp_number: String,
    pub philhealth_number: String,
    pub pagibig_number: String,
    pub tin: String,
    pub id_number: String,

    // Employment
    pub position: String,
    pub salary_grade: String,
    pub basic_salary: Option<f64>,
    pub department: String,
    pub place_of_assignment: String,
    pub original_place_of_assignment: String,
    pub item_number: String,
    pub date_appointed: Option<String>,
    pub date_of_last_promotion: Option<String>,
    pub date_of_separation: Option<String>,
    pub employment_status: String,
    pub eligibility: String,

    /// `Active` employees may record attendance
    pub status: String,
}

/// Request body for creating or updating an employee.
///
/// # JSON Example
///
/// ```json
/// {
///   "full_name": "Juan Dela Cruz",
///   "employee_code": "emp-001",
///   "department": "Finance",
///   "age": 34,
///   "face_encodings": [[0.01, -0.02, ...]]
/// }
/// ```
///
/// Only `full_name` and `employee_code` are required. `face_encodings` is
/// ignored on update; use the face enrollment endpoint instead.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmployeeInput {
    pub full_name: Option<String>,
    pub employee_code: Option<String>,
    pub address: Option<String>,
    pub place_of_birth: Option<String>,
    pub blood_type: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub civil_status: Option<String>,
    pub age: Option<i64>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub course: Option<String>,
    pub entity_office: Option<String>,
    pub bp_number: Option<String>,
    pub philhealth_number: Option<String>,
    pub pagibig_number: Option<String>,
    pub tin: Option<String>,
    pub id_number: Option<String>,
    pub position: Option<String>,
    pub salary_grade: Option<String>,
    pub basic_salary: Option<f64>,
    pub department: Option<String>,
    pub place_of_assignment: Option<String>,
    pub original_place_of_assignment: Option<String>,
    pub item_number: Option<String>,
    pub date_appointed: Option<String>,
    pub date_of_last_promotion: Option<String>,
    pub date_of_separation: Option<String>,
    pub employment_status: Option<String>,
    pub eligibility: Option<String>,
    pub status: Option<String>,
    pub face_encodings: Vec<Vec<f64>>,
}

impl EmployeeInput {
    /// Validate and normalize every field, reporting all failures together.
    pub fn validate(&self) -> Result<EmployeeFields, AppError> {
        use validation::sanitize;

        let mut errors = validation::Errors::default();
        let text = |v: &Option<String>, max| sanitize(v.as_deref(), max);

        let fields = EmployeeFields {
            full_name: errors.check(validation::name(self.full_name.as_deref(), "Full Name")),
            employee_code: errors.check(validation::employee_code(self.employee_code.as_deref())),
            address: text(&self.address, 500),
            place_of_birth: text(&self.place_of_birth, 100),
            blood_type: text(&self.blood_type, 10),
            date_of_birth: errors.check(validation::date(
                self.date_of_birth.as_deref(),
                "Date of Birth",
            )),
            gender: text(&self.gender, 20),
            civil_status: text(&self.civil_status, 20),
            age: errors.check(validation::integer_in_range(self.age, "Age", 16, 100)),
            contact_number: errors.check(validation::phone(
                self.contact_number.as_deref(),
                "Contact Number",
            )),
            email: errors.check(validation::email(self.email.as_deref(), "Email")),
            course: text(&self.course, 100),
            entity_office: text(&self.entity_office, 200),
            bp_number: text(&self.bp_number, 50),
            philhealth_number: text(&self.philhealth_number, 50),
            pagibig_number: text(&self.pagibig_number, 50),
            tin: text(&self.tin, 50),
            id_number: text(&self.id_number, 50),
            position: text(&self.position, 100),
            salary_grade: text(&self.salary_grade, 20),
            basic_salary: errors.check(validation::non_negative(self.basic_salary, "Basic Salary")),
            department: text(&self.department, 100),
            place_of_assignment: text(&self.place_of_assignment, 200),
            original_place_of_assignment: text(&self.original_place_of_assignment, 200),
            item_number: text(&self.item_number, 50),
            date_appointed: errors.check(validation::date(
                self.date_appointed.as_deref(),
                "Date Appointed",
            )),
            date_of_last_promotion: errors.check(validation::date(
                self.date_of_last_promotion.as_deref(),
                "Date of Last Promotion",
            )),
            date_of_separation: errors.check(validation::date(
                self.date_of_separation.as_deref(),
                "Date of Separation",
            )),
            employment_status: text(&self.employment_status, 50),
            eligibility: text(&self.eligibility, 100),
            status: match sanitize(self.status.as_deref(), 20) {
                s if s.is_empty() => ACTIVE_STATUS.to_string(),
                s => s,
            },
        };

        errors.into_result().map_err(AppError::InvalidRequest)?;
        Ok(fields)
    }
}

/// Compact employee row used by lists and pickers.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct EmployeeSummary {
    pub id: i64,
    pub full_name: String,
    pub employee_code: String,
    pub department: String,
    pub position: String,
    pub status: String,
    /// Whether a face descriptor is enrolled
    pub has_face: bool,
}

/// Query string for `GET /api/employees`.
#[derive(Debug, Default, Deserialize)]
pub struct EmployeeSearch {
    #[serde(default)]
    pub search: Option<String>,
}

/// Identity returned after a successful face match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedEmployee {
    pub id: i64,
    pub full_name: String,
    pub employee_code: String,
}

impl From<&Employee> for MatchedEmployee {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            full_name: employee.fields.full_name.clone(),
            employee_code: employee.fields.employee_code.clone(),
        }
    }
}
