//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, and complex operations.

pub mod admin_service;
pub mod attendance_service;
pub mod employee_service;
pub mod export_service;
pub mod face_service;
