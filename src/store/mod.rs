//! # Store Module
//!
//! Durable local persistence for the cached user roster, issued session
//! tokens, and sync bookkeeping. The store survives process restarts and
//! is the source of truth that in-memory session state must reconcile
//! against.

pub mod models;
pub mod service;


pub use models::{AuthToken, CachedUser, SyncStats};
pub use service::LocalStore;

/// Metadata key holding the id of the currently signed-in user.
/// Cleared (set to the empty string) on logout.
pub const META_CURRENT_USER_ID: &str = "current_user_id";
/// Metadata key flagging whether the active session was established
/// offline ("true"/"false").
pub const META_OFFLINE_MODE: &str = "offline_mode";
/// Metadata key holding the instant of the last successful roster sync.
pub const META_LAST_SYNC: &str = "last_sync";
/// Metadata key holding the record count of the last successful sync.
pub const META_LAST_SYNC_COUNT: &str = "last_sync_count";
