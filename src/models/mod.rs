//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response bodies built from them.

/// Admin accounts and sessions
pub mod admin;
/// Daily time record
pub mod attendance;
/// Employee registry
pub mod employee;
/// Face descriptors
pub mod face;
