//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to a service
//! 3. Returns HTTP response (JSON, CSV, status code)

/// Admin login and account management
pub mod admins;
/// Back-office attendance endpoints
pub mod attendance;
/// Employee registry endpoints
pub mod employees;
/// CSV exports
pub mod exports;
/// Health check endpoint
pub mod health;
/// Public kiosk endpoints
pub mod kiosk;
