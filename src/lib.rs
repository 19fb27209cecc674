//! rostersync: offline-capable authentication and user roster cache.
//!
//! A client-resident component for apps that must let a user sign in and
//! browse the account roster even when the authoritative server is
//! unreachable, converging back to the server's state once connectivity
//! returns.
//!
//! Three cooperating services, leaves first:
//!
//! - [`LocalStore`]: durable SQLite storage for cached users, issued
//!   session tokens, and sync bookkeeping.
//! - [`AuthService`]: the online/offline login state machine. Tries the
//!   server first, falls back to verifying the password against the
//!   cached bcrypt hash, and tracks which mode the session is in.
//! - [`SyncService`]: decides when the cache is stale and mirrors the
//!   server's roster into it wholesale.
//!
//! The server is always the writer of record for the roster; this crate
//! only reads it. Presentation concerns (views, navigation, input) live
//! in the consumer: they feed credentials and "sync now" triggers in and
//! read the authenticated user, auth state, and sync status out.
//!
//! ```no_run
//! use rostersync::{ClientConfig, RosterClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RosterClient::new(&ClientConfig::from_env());
//!
//! let login = client.auth.login("pat@example.com", "hunter2").await?;
//! println!("signed in via {} path", login.mode);
//!
//! let refresh = client.sync.refresh_roster().await;
//! println!("{} accounts cached", refresh.users.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

pub mod auth;
pub mod common;
pub mod config;
pub mod remote;
pub mod store;
pub mod sync;

pub use auth::{AuthService, LoginMode, LoginSuccess, OfflineTokenPayload};
pub use common::error::{ApiClientError, AuthError, StoreError, SyncError};
pub use config::ClientConfig;
pub use remote::{RemoteUser, RosterApi};
pub use store::{AuthToken, CachedUser, LocalStore, SyncStats};
pub use sync::{RosterRefresh, SyncService};

/// The wired-up client: one store, one API client, and the two services
/// that share them.
pub struct RosterClient {
    pub store: Arc<LocalStore>,
    pub api: Arc<RosterApi>,
    pub auth: Arc<AuthService>,
    pub sync: Arc<SyncService>,
}

impl RosterClient {
    pub fn new(config: &ClientConfig) -> Self {
        let store = Arc::new(LocalStore::new(config.database_url.clone()));
        let api = Arc::new(RosterApi::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        ));
        let auth = Arc::new(AuthService::new(
            Arc::clone(&store),
            Arc::clone(&api),
            config.token_ttl_secs,
        ));
        let sync = Arc::new(SyncService::new(
            Arc::clone(&store),
            Arc::clone(&api),
            Arc::clone(&auth),
            config.sync_max_age_minutes,
        ));

        Self {
            store,
            api,
            auth,
            sync,
        }
    }
}
