// Common module - shared types and utilities across all modules

pub mod error;
pub mod helpers;
pub mod migrations;

// Re-export commonly used types for convenience
pub use error::{ApiClientError, AuthError, StoreError, SyncError};
pub use helpers::{now_rfc3339, parse_rfc3339, safe_email_log};
