//! Row models for the local store

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A server-owned user record mirrored into the local cache.
///
/// The whole set is overwritten on every successful roster sync; only the
/// mutable fields (`username`, `organization`, `offline_enabled` and the
/// timestamps) change locally between syncs. `id` and `email` never do.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CachedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub organization: Option<String>,
    /// bcrypt hash cached from the server; a record without one can never
    /// pass offline verification.
    pub password_hash: Option<String>,
    /// Stored as INTEGER 0/1, SQLite-style.
    pub offline_enabled: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_login_at: Option<String>,
    pub last_sync_at: Option<String>,
}

impl CachedUser {
    pub fn offline_login_enabled(&self) -> bool {
        self.offline_enabled != 0
    }
}

/// An issued session token. Several may exist per user (one per login);
/// only the newest non-expired one is current.
#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub token_type: String,
    pub expires_at: String,
    pub created_at: String,
}

/// Snapshot of sync bookkeeping for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    pub last_sync: Option<String>,
    pub last_sync_count: i64,
    pub user_count: i64,
    pub authenticated: bool,
}
