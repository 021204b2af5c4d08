//! Admin account and session models.
//!
//! Admin passwords are stored as salted HMAC-SHA256 digests. Sessions are
//! identified by random bearer tokens of which only the SHA-256 hash is kept.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Represents an admin record from the database.
///
/// # Database Table
///
/// Maps to the `admins` table with columns:
/// - `id`: Unique identifier
/// - `username`: Lower-case login name (unique)
/// - `password_hash`: hex HMAC-SHA256 of the password keyed by `password_salt`
/// - `password_salt`: 16 random bytes, hex encoded
/// - `name`: Display name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub password_salt: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// Admin as returned to clients (no credentials).
#[derive(Debug, Clone, Serialize)]
pub struct AdminResponse {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            name: admin.name,
            created_at: admin.created_at,
        }
    }
}

/// Request body for `POST /api/admins`.
#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Request body for `PUT /api/admins/{id}`.
///
/// The password is only changed when present and non-blank.
#[derive(Debug, Deserialize)]
pub struct UpdateAdminRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Request body for `POST /api/admin/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Response body for a successful login.
///
/// `token` is shown exactly once; send it back as `Authorization: Bearer <token>`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub name: String,
    pub expires_at: NaiveDateTime,
}

/// Session row joined with the owning admin, used by the auth middleware.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionAdmin {
    pub admin_id: i64,
    pub username: String,
    pub name: String,
    pub expires_at: NaiveDateTime,
}
