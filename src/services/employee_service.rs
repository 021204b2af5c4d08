//! Employee registry service.
//!
//! Registration optionally enrolls a face in the same request. Deleting an
//! employee cascades to their face descriptor and attendance rows.

use crate::{
    db::DbPool,
    error::{AppError, conflict_on_unique},
    models::employee::{Employee, EmployeeFields, EmployeeSummary},
    services::face_service::{self, FaceGallery},
};

const SUMMARY_SELECT: &str = r#"
    SELECT e.id, e.full_name, e.employee_code, e.department, e.position, e.status,
           EXISTS(SELECT 1 FROM facial_data f WHERE f.employee_id = e.id) AS has_face
    FROM employees e
"#;

fn duplicate_code(err: sqlx::Error, code: &str) -> AppError {
    conflict_on_unique(err, &format!("Employee ID '{code}' already exists"))
}

/// Register a new employee.
///
/// # Process
///
/// 1. Average `face_encodings` when any are given
/// 2. Insert the employee row and the face in one transaction
/// 3. Invalidate the face cache after commit
///
/// A failed face insert rolls back the employee row.
pub async fn register(
    pool: &DbPool,
    faces: &FaceGallery,
    fields: &EmployeeFields,
    face_encodings: &[Vec<f64>],
) -> Result<Employee, AppError> {
    let encoding = if face_encodings.is_empty() {
        None
    } else {
        Some(face_service::mean_encoding(face_encodings)?)
    };

    let mut tx = pool.begin().await?;

    let employee = sqlx::query_as::<_, Employee>(
        r#"
        INSERT INTO employees (
            full_name, employee_code, address, place_of_birth, blood_type, date_of_birth,
            gender, civil_status, age, contact_number, email, course, entity_office,
            bp_number, philhealth_number, pagibig_number, tin, id_number, position,
            salary_grade, basic_salary, department, place_of_assignment,
            original_place_of_assignment, item_number, date_appointed,
            date_of_last_promotion, date_of_separation, employment_status, eligibility, status
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&fields.full_name)
    .bind(&fields.employee_code)
    .bind(&fields.address)
    .bind(&fields.place_of_birth)
    .bind(&fields.blood_type)
    .bind(&fields.date_of_birth)
    .bind(&fields.gender)
    .bind(&fields.civil_status)
    .bind(fields.age)
    .bind(&fields.contact_number)
    .bind(&fields.email)
    .bind(&fields.course)
    .bind(&fields.entity_office)
    .bind(&fields.bp_number)
    .bind(&fields.philhealth_number)
    .bind(&fields.pagibig_number)
    .bind(&fields.tin)
    .bind(&fields.id_number)
    .bind(&fields.position)
    .bind(&fields.salary_grade)
    .bind(fields.basic_salary)
    .bind(&fields.department)
    .bind(&fields.place_of_assignment)
    .bind(&fields.original_place_of_assignment)
    .bind(&fields.item_number)
    .bind(&fields.date_appointed)
    .bind(&fields.date_of_last_promotion)
    .bind(&fields.date_of_separation)
    .bind(&fields.employment_status)
    .bind(&fields.eligibility)
    .bind(&fields.status)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| duplicate_code(e, &fields.employee_code))?;

    if let Some(encoding) = &encoding {
        face_service::store_encoding(&mut tx, employee.id, encoding).await?;
    }

    tx.commit().await?;

    if encoding.is_some() {
        faces.invalidate().await;
    }

    tracing::info!(
        "Employee registered: {} ({})",
        employee.fields.full_name,
        employee.fields.employee_code
    );
    Ok(employee)
}

/// List employees ordered by name, optionally filtered by a search term
/// matched against name, code, department and position.
pub async fn list(pool: &DbPool, search: Option<&str>) -> Result<Vec<EmployeeSummary>, AppError> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());

    let employees = match search {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, EmployeeSummary>(&format!(
                "{SUMMARY_SELECT} WHERE e.full_name LIKE ?1 OR e.employee_code LIKE ?1 \
                 OR e.department LIKE ?1 OR e.position LIKE ?1 ORDER BY e.full_name"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, EmployeeSummary>(&format!("{SUMMARY_SELECT} ORDER BY e.full_name"))
                .fetch_all(pool)
                .await?
        }
    };

    Ok(employees)
}

/// Full employee rows for the CSV export.
pub async fn export_rows(pool: &DbPool, search: Option<&str>) -> Result<Vec<Employee>, AppError> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"));

    let employees = sqlx::query_as::<_, Employee>(
        r#"
        SELECT * FROM employees
        WHERE ?1 IS NULL
           OR full_name LIKE ?1 OR employee_code LIKE ?1
           OR department LIKE ?1 OR position LIKE ?1
        ORDER BY full_name
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(employees)
}

pub async fn get(pool: &DbPool, id: i64) -> Result<Employee, AppError> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::EmployeeNotFound)
}

/// Replace every stored field of an employee.
pub async fn update(pool: &DbPool, id: i64, fields: &EmployeeFields) -> Result<Employee, AppError> {
    let employee = sqlx::query_as::<_, Employee>(
        r#"
        UPDATE employees SET
            full_name = ?, employee_code = ?, address = ?, place_of_birth = ?,
            blood_type = ?, date_of_birth = ?, gender = ?, civil_status = ?, age = ?,
            contact_number = ?, email = ?, course = ?, entity_office = ?, bp_number = ?,
            philhealth_number = ?, pagibig_number = ?, tin = ?, id_number = ?,
            position = ?, salary_grade = ?, basic_salary = ?, department = ?,
            place_of_assignment = ?, original_place_of_assignment = ?, item_number = ?,
            date_appointed = ?, date_of_last_promotion = ?, date_of_separation = ?,
            employment_status = ?, eligibility = ?, status = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&fields.full_name)
    .bind(&fields.employee_code)
    .bind(&fields.address)
    .bind(&fields.place_of_birth)
    .bind(&fields.blood_type)
    .bind(&fields.date_of_birth)
    .bind(&fields.gender)
    .bind(&fields.civil_status)
    .bind(fields.age)
    .bind(&fields.contact_number)
    .bind(&fields.email)
    .bind(&fields.course)
    .bind(&fields.entity_office)
    .bind(&fields.bp_number)
    .bind(&fields.philhealth_number)
    .bind(&fields.pagibig_number)
    .bind(&fields.tin)
    .bind(&fields.id_number)
    .bind(&fields.position)
    .bind(&fields.salary_grade)
    .bind(fields.basic_salary)
    .bind(&fields.department)
    .bind(&fields.place_of_assignment)
    .bind(&fields.original_place_of_assignment)
    .bind(&fields.item_number)
    .bind(&fields.date_appointed)
    .bind(&fields.date_of_last_promotion)
    .bind(&fields.date_of_separation)
    .bind(&fields.employment_status)
    .bind(&fields.eligibility)
    .bind(&fields.status)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| duplicate_code(e, &fields.employee_code))?
    .ok_or(AppError::EmployeeNotFound)?;

    tracing::info!("Employee {} updated", id);
    Ok(employee)
}

/// Delete an employee with their face and attendance rows.
pub async fn delete(pool: &DbPool, faces: &FaceGallery, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::EmployeeNotFound);
    }

    faces.invalidate().await;
    tracing::info!("Employee {} deleted", id);
    Ok(())
}
