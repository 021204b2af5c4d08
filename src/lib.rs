//! Face biometric attendance server.
//!
//! A kiosk page computes a face descriptor in the browser and posts it here.
//! The server identifies the employee against the enrolled gallery and records
//! the next punch of their daily time record. An authenticated back office
//! manages employees, admins, corrections, reports and CSV exports.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP, HTTPS via rustls)
//! - **Database**: SQLite in WAL mode with sqlx
//! - **Authentication**: admin bearer sessions, SHA-256 hashed at rest
//! - **Format**: JSON requests/responses, CSV exports

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod launcher;
pub mod middleware;
pub mod models;
pub mod services;
pub mod tls;
pub mod validation;
