//! HTTP handlers for admin login and admin account management.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AdminContext,
    models::admin::{
        AdminResponse, CreateAdminRequest, LoginRequest, LoginResponse, UpdateAdminRequest,
    },
    services::admin_service,
};

/// Exchange credentials for a session token.
///
/// # Request Body
///
/// ```json
/// { "username": "admin", "password": "admin123" }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "9f86d0...", "name": "System Admin", "expires_at": "2026-10-19T20:00:00" }
/// ```
///
/// The token is shown once; send it as `Authorization: Bearer <token>`.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = admin_service::login(
        &state.pool,
        &request,
        state.config.session_ttl_hours,
        state.now(),
    )
    .await?;
    Ok(Json(session))
}

/// End the current session. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
) -> Result<StatusCode, AppError> {
    admin_service::logout(&state.pool, &admin.token).await?;
    tracing::info!("Admin logged out: {}", admin.username);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_admins(State(state): State<AppState>) -> Result<Json<Vec<AdminResponse>>, AppError> {
    Ok(Json(admin_service::list(&state.pool).await?))
}

/// Create an admin account. Returns 201 Created.
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Json(request): Json<CreateAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created =
        admin_service::create(&state.pool, &request, state.config.password_min_length).await?;
    tracing::info!("Admin '{}' created by {}", created.username, admin.name);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AdminResponse>, AppError> {
    Ok(Json(admin_service::get(&state.pool, id).await?))
}

/// Update an admin. A blank or missing password keeps the current one.
pub async fn update_admin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAdminRequest>,
) -> Result<Json<AdminResponse>, AppError> {
    let updated =
        admin_service::update(&state.pool, id, &request, state.config.password_min_length).await?;
    Ok(Json(updated))
}

/// Delete an admin. The last admin account is protected.
pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    admin_service::delete(&state.pool, id).await?;
    tracing::info!("Admin {} deleted by {} (ID {})", id, admin.name, admin.admin_id);
    Ok(StatusCode::NO_CONTENT)
}
