//! Common utilities and shared functionality
//!
//! Shared types, the collaborator traits the core consumes, and the
//! configuration loader.

pub mod types;
pub mod config;
pub mod traits;
