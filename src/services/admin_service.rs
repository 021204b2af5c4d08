//! Admin accounts and bearer sessions.
//!
//! # Security Model
//!
//! - Passwords are stored as `hex(HMAC-SHA256(key = salt, password))` with a
//!   fresh random salt per account, and verified in constant time.
//! - Session tokens are 32 random bytes, hex encoded. Only `SHA-256(token)`
//!   is persisted, so a leaked database does not leak usable tokens.

use chrono::{Duration, NaiveDateTime};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::{
    config::Config,
    db::DbPool,
    error::{AppError, conflict_on_unique},
    models::admin::{
        Admin, AdminResponse, CreateAdminRequest, LoginRequest, LoginResponse, SessionAdmin,
        UpdateAdminRequest,
    },
    validation,
};

type HmacSha256 = Hmac<Sha256>;

const USERNAME_TAKEN: &str = "Username already exists";

fn mac_for(salt: &str, password: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC key length is valid");
    mac.update(password.as_bytes());
    mac
}

pub fn hash_password(salt: &str, password: &str) -> String {
    hex::encode(mac_for(salt, password).finalize().into_bytes())
}

pub fn verify_password(admin: &Admin, password: &str) -> bool {
    let Ok(expected) = hex::decode(&admin.password_hash) else {
        return false;
    };
    mac_for(&admin.password_salt, password)
        .verify_slice(&expected)
        .is_ok()
}

pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check credentials and open a session valid for `ttl_hours`.
///
/// Expired sessions are purged on every login.
pub async fn login(
    pool: &DbPool,
    request: &LoginRequest,
    ttl_hours: i64,
    now: NaiveDateTime,
) -> Result<LoginResponse, AppError> {
    let username = request
        .username
        .as_deref()
        .map(|u| u.trim().to_lowercase())
        .unwrap_or_default();
    let password = request.password.as_deref().unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        return Err(AppError::InvalidRequest(
            "Username and password are required".to_string(),
        ));
    }

    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = ?")
        .bind(&username)
        .fetch_optional(pool)
        .await?;

    let Some(admin) = admin.filter(|a| verify_password(a, password)) else {
        tracing::warn!("Failed login attempt for username: {}", username);
        return Err(AppError::InvalidCredentials);
    };

    sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;

    let token = generate_token();
    let expires_at = now + Duration::hours(ttl_hours);

    sqlx::query("INSERT INTO admin_sessions (admin_id, token_hash, expires_at) VALUES (?, ?, ?)")
        .bind(admin.id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(pool)
        .await?;

    tracing::info!("Admin logged in: {}", admin.username);

    Ok(LoginResponse {
        token,
        name: admin.name,
        expires_at,
    })
}

pub async fn logout(pool: &DbPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM admin_sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve a bearer token to its admin, if the session is still valid.
pub async fn authenticate(
    pool: &DbPool,
    token: &str,
    now: NaiveDateTime,
) -> Result<SessionAdmin, AppError> {
    sqlx::query_as::<_, SessionAdmin>(
        r#"
        SELECT s.admin_id, a.username, a.name, s.expires_at
        FROM admin_sessions s
        JOIN admins a ON a.id = s.admin_id
        WHERE s.token_hash = ? AND s.expires_at > ?
        "#,
    )
    .bind(hash_token(token))
    .bind(now)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::Unauthorized)
}

pub async fn list(pool: &DbPool) -> Result<Vec<AdminResponse>, AppError> {
    let admins = sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY username")
        .fetch_all(pool)
        .await?;
    Ok(admins.into_iter().map(AdminResponse::from).collect())
}

pub async fn get(pool: &DbPool, id: i64) -> Result<AdminResponse, AppError> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(AdminResponse::from)
        .ok_or(AppError::AdminNotFound)
}

fn validate_name(name: Option<&str>) -> validation::FieldResult<String> {
    let name = validation::required(name, "Name")?;
    Ok(validation::sanitize(Some(&name), 100))
}

pub async fn create(
    pool: &DbPool,
    request: &CreateAdminRequest,
    password_min_length: usize,
) -> Result<AdminResponse, AppError> {
    let mut errors = validation::Errors::default();
    let username = errors.check(validation::username(request.username.as_deref()));
    let password = errors.check(validation::password(
        request.password.as_deref(),
        password_min_length,
    ));
    let name = errors.check(validate_name(request.name.as_deref()));
    errors.into_result().map_err(AppError::InvalidRequest)?;

    let admin = insert_admin(pool, &username, &password, &name).await?;
    tracing::info!("New admin account created: {}", admin.username);
    Ok(admin.into())
}

async fn insert_admin(
    pool: &DbPool,
    username: &str,
    password: &str,
    name: &str,
) -> Result<Admin, AppError> {
    let salt = generate_salt();
    sqlx::query_as::<_, Admin>(
        r#"
        INSERT INTO admins (username, password_hash, password_salt, name)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(hash_password(&salt, password))
    .bind(&salt)
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, USERNAME_TAKEN))
}

/// Update username and name, and the password when one is given.
///
/// Changing the password signs the admin out everywhere.
pub async fn update(
    pool: &DbPool,
    id: i64,
    request: &UpdateAdminRequest,
    password_min_length: usize,
) -> Result<AdminResponse, AppError> {
    let new_password = request
        .password
        .as_deref()
        .filter(|p| !p.trim().is_empty());

    let mut errors = validation::Errors::default();
    let username = errors.check(validation::username(request.username.as_deref()));
    let name = errors.check(validate_name(request.name.as_deref()));
    let password = match new_password {
        Some(p) => Some(errors.check(validation::password(Some(p), password_min_length))),
        None => None,
    };
    errors.into_result().map_err(AppError::InvalidRequest)?;

    let mut tx = pool.begin().await?;

    let admin = sqlx::query_as::<_, Admin>(
        "UPDATE admins SET username = ?, name = ? WHERE id = ? RETURNING *",
    )
    .bind(&username)
    .bind(&name)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, USERNAME_TAKEN))?
    .ok_or(AppError::AdminNotFound)?;

    if let Some(password) = password {
        let salt = generate_salt();
        sqlx::query("UPDATE admins SET password_hash = ?, password_salt = ? WHERE id = ?")
            .bind(hash_password(&salt, &password))
            .bind(&salt)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM admin_sessions WHERE admin_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!("Admin account updated: ID {}", id);
    Ok(admin.into())
}

/// Delete an admin. The last remaining admin cannot be deleted.
pub async fn delete(pool: &DbPool, id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let username: String = sqlx::query_scalar("SELECT username FROM admins WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::AdminNotFound)?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(&mut *tx)
        .await?;
    if count <= 1 {
        return Err(AppError::LastAdmin);
    }

    sqlx::query("DELETE FROM admins WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("Admin account deleted: ID {} ({})", id, username);
    Ok(())
}

/// Create the configured admin when the `admins` table is empty.
///
/// Returns `true` when an account was created.
pub async fn ensure_bootstrap_admin(pool: &DbPool, config: &Config) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(false);
    }

    let username = validation::username(Some(&config.bootstrap_admin_username))
        .map_err(AppError::InvalidRequest)?;
    let password = validation::password(
        Some(&config.bootstrap_admin_password),
        config.password_min_length,
    )
    .map_err(|msg| AppError::InvalidRequest(format!("BOOTSTRAP_ADMIN_PASSWORD: {msg}")))?;
    insert_admin(
        pool,
        &username,
        &password,
        &config.bootstrap_admin_name,
    )
    .await?;

    tracing::warn!(
        "Created initial admin account '{}'. Change its password after first login!",
        username
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    async fn setup() -> DbPool {
        let pool = crate::db::create_memory_pool().await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        let config = Config::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert!(ensure_bootstrap_admin(&pool, &config).await.unwrap());
        pool
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn password_hash_depends_on_salt() {
        let a = hash_password("salt-a", "secret");
        let b = hash_password("salt-b", "secret");
        assert_ne!(a, b);
        assert_eq!(a, hash_password("salt-a", "secret"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn tokens_are_random_hex() {
        let a = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, generate_token());
        assert_eq!(hash_token(&a), hash_token(&a));
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let pool = setup().await;
        let config = Config::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert!(!ensure_bootstrap_admin(&pool, &config).await.unwrap());
        assert_eq!(list(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bootstrap_password_must_meet_minimum_length() {
        let pool = crate::db::create_memory_pool().await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        let config = Config::from_iter(vec![(
            "BOOTSTRAP_ADMIN_PASSWORD".to_string(),
            "short".to_string(),
        )])
        .unwrap();

        let err = ensure_bootstrap_admin(&pool, &config).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(ref msg) if msg.contains("at least 8")));
        assert!(list(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn login_session_lifecycle() {
        let pool = setup().await;

        let err = login(&pool, &login_request("admin", "wrong"), 12, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let session = login(&pool, &login_request("ADMIN", "admin123"), 12, now())
            .await
            .unwrap();
        assert_eq!(session.name, "System Admin");

        let admin = authenticate(&pool, &session.token, now()).await.unwrap();
        assert_eq!(admin.username, "admin");

        let later = now() + Duration::hours(13);
        assert!(matches!(
            authenticate(&pool, &session.token, later).await.unwrap_err(),
            AppError::Unauthorized
        ));

        logout(&pool, &session.token).await.unwrap();
        assert!(matches!(
            authenticate(&pool, &session.token, now()).await.unwrap_err(),
            AppError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn crud_rules() {
        let pool = setup().await;

        let created = create(
            &pool,
            &CreateAdminRequest {
                username: Some("Clerk_1".to_string()),
                password: Some("password1".to_string()),
                name: Some("Clerk One".to_string()),
            },
            8,
        )
        .await
        .unwrap();
        assert_eq!(created.username, "clerk_1");

        let duplicate = create(
            &pool,
            &CreateAdminRequest {
                username: Some("clerk_1".to_string()),
                password: Some("password2".to_string()),
                name: Some("Clerk Two".to_string()),
            },
            8,
        )
        .await
        .unwrap_err();
        assert!(matches!(duplicate, AppError::Conflict(_)));

        let session = login(&pool, &login_request("clerk_1", "password1"), 12, now())
            .await
            .unwrap();
        update(
            &pool,
            created.id,
            &UpdateAdminRequest {
                username: Some("clerk_1".to_string()),
                password: Some("new-password".to_string()),
                name: Some("Clerk Renamed".to_string()),
            },
            8,
        )
        .await
        .unwrap();
        assert!(authenticate(&pool, &session.token, now()).await.is_err());
        assert!(
            login(&pool, &login_request("clerk_1", "new-password"), 12, now())
                .await
                .is_ok()
        );

        delete(&pool, created.id).await.unwrap();
        let only = list(&pool).await.unwrap();
        assert_eq!(only.len(), 1);
        assert!(matches!(
            delete(&pool, only[0].id).await.unwrap_err(),
            AppError::LastAdmin
        ));
        assert!(matches!(
            delete(&pool, 99).await.unwrap_err(),
            AppError::AdminNotFound
        ));
    }
}
