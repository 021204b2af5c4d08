//! Shared application state and the HTTP router.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::FromRef,
    http::{HeaderValue, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use chrono::NaiveDateTime;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::{
    config::{AttendanceWindows, Config},
    db::DbPool,
    handlers, middleware,
    services::face_service::FaceGallery,
};

/// Source of the current local time.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub windows: AttendanceWindows,
    pub faces: Arc<FaceGallery>,
    pub clock: Clock,
}

impl AppState {
    /// Build state using the system's local clock.
    ///
    /// # Errors
    ///
    /// Returns an error if an attendance window in `config` is not `HH:MM`.
    pub fn new(pool: DbPool, config: Config) -> Result<Self, chrono::ParseError> {
        let windows = AttendanceWindows::from_config(&config)?;
        let faces = FaceGallery::new(Duration::from_secs(config.face_cache_ttl_secs));

        Ok(Self {
            pool,
            config: Arc::new(config),
            windows,
            faces: Arc::new(faces),
            clock: Arc::new(|| chrono::Local::now().naive_local()),
        })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

/// Build the complete router.
///
/// Public routes serve the kiosk. Everything else requires an admin session.
pub fn build_router(state: AppState) -> Router {
    // Admin back office (bearer session required)
    let admin_routes = Router::new()
        .route("/api/admin/logout", post(handlers::admins::logout))
        .route("/api/dashboard-stats", get(handlers::attendance::dashboard_stats))
        .route(
            "/api/attendance-records",
            get(handlers::attendance::attendance_records),
        )
        .route(
            "/api/attendance/mark-day",
            post(handlers::attendance::mark_day),
        )
        .route(
            "/api/attendance/{id}",
            put(handlers::attendance::update_attendance),
        )
        .route("/api/reports/dtr", get(handlers::attendance::dtr_report))
        .route(
            "/api/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/api/employees/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
        .route(
            "/api/employees/{id}/face",
            post(handlers::employees::enroll_face),
        )
        .route(
            "/api/admins",
            get(handlers::admins::list_admins).post(handlers::admins::create_admin),
        )
        .route(
            "/api/admins/{id}",
            get(handlers::admins::get_admin)
                .put(handlers::admins::update_admin)
                .delete(handlers::admins::delete_admin),
        )
        .route(
            "/api/export/attendance.csv",
            get(handlers::exports::export_attendance),
        )
        .route(
            "/api/export/employees.csv",
            get(handlers::exports::export_employees),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        // Public routes
        .route("/health", get(handlers::health::health_check))
        .route("/attendance", get(handlers::kiosk::attendance_page))
        .route("/api/recognize-face", post(handlers::kiosk::recognize_face))
        .route(
            "/api/attendance-history",
            get(handlers::kiosk::attendance_history),
        )
        .route("/api/admin/login", post(handlers::admins::login))
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_static("SecureServer"),
        ))
        .with_state(state)
}
