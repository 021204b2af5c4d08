//! Admin session authentication middleware.
//!
//! This middleware intercepts every back-office request to:
//! 1. Extract the session token from the Authorization header
//! 2. Resolve it to an unexpired session
//! 3. Inject `AdminContext` into the request
//! 4. Reject everything else with HTTP 401

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::AppError, services::admin_service};

/// Authenticated admin attached to the request's extensions.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub admin_id: i64,
    pub username: String,
    pub name: String,
    /// Raw bearer token, needed to end the session on logout
    pub token: String,
}

/// Session authentication middleware function.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer <token from /api/admin/login>
/// ```
///
/// # Returns
///
/// - The next handler's response when the session is valid
/// - `AppError::Unauthorized` (401) when the header is missing or the session
///   is unknown or expired
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let session = admin_service::authenticate(&state.pool, &token, state.now()).await?;

    request.extensions_mut().insert(AdminContext {
        admin_id: session.admin_id,
        username: session.username,
        name: session.name,
        token,
    });

    Ok(next.run(request).await)
}
