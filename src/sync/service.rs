//! Sync coordinator

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::auth::service::AuthService;
use crate::common::error::{ApiClientError, StoreError, SyncError};
use crate::common::helpers::{now_rfc3339, parse_rfc3339};
use crate::remote::client::RosterApi;
use crate::store::models::{CachedUser, SyncStats};
use crate::store::service::LocalStore;
use crate::store::{META_LAST_SYNC, META_LAST_SYNC_COUNT};

/// Result of a view-activation refresh: the roster that can be shown
/// (possibly stale) plus whether a sync ran and how it went. A sync
/// failure never hides already-loaded cached data.
#[derive(Debug)]
pub struct RosterRefresh {
    pub users: Vec<CachedUser>,
    pub synced: bool,
    pub sync_error: Option<SyncError>,
}

/// The staleness decision, separated from clock and storage so it can be
/// exercised with simulated time: due when no sync has ever completed or
/// the last one is older than the threshold.
pub fn sync_due(
    last_sync: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_age_minutes: i64,
) -> bool {
    match last_sync {
        None => true,
        Some(last) => now.signed_duration_since(last) > Duration::minutes(max_age_minutes),
    }
}

/// Pulls the full roster from the server and replaces the local cache.
pub struct SyncService {
    store: Arc<LocalStore>,
    api: Arc<RosterApi>,
    auth: Arc<AuthService>,
    max_age_minutes: i64,
    /// Serializes syncs within this process so two callers can never
    /// interleave roster replacement.
    in_flight: Mutex<()>,
}

impl SyncService {
    pub fn new(
        store: Arc<LocalStore>,
        api: Arc<RosterApi>,
        auth: Arc<AuthService>,
        max_age_minutes: i64,
    ) -> Self {
        Self {
            store,
            api,
            auth,
            max_age_minutes,
            in_flight: Mutex::new(()),
        }
    }

    /// True if no sync has ever completed or the last one is older than
    /// `max_age_minutes`. An unreadable timestamp counts as stale.
    pub async fn is_sync_needed(&self, max_age_minutes: i64) -> Result<bool, StoreError> {
        let last_sync = self
            .store
            .metadata(META_LAST_SYNC)
            .await?
            .and_then(|value| parse_rfc3339(&value));
        Ok(sync_due(last_sync, Utc::now(), max_age_minutes))
    }

    /// Replaces the entire cached roster from `GET /api/users` and records
    /// the sync instant and record count.
    ///
    /// Requires a valid session. Note the store-level side effect: the
    /// roster replacement wipes every stored token, including the one
    /// that authorized this sync. An offline session keeps working only
    /// through the auth manager's in-memory copy until the next
    /// `is_authenticated` check reports false.
    pub async fn sync_users(&self) -> Result<u64, SyncError> {
        let _guard = self.in_flight.lock().await;

        if !self.auth.is_authenticated().await? {
            return Err(SyncError::AuthRequired);
        }
        let Some(token) = self.auth.bearer_token().await? else {
            return Err(SyncError::AuthRequired);
        };

        let remote_users = self.api.fetch_users(&token).await.map_err(classify_failure)?;

        let users: Vec<CachedUser> = remote_users.into_iter().map(Into::into).collect();
        let count = self.store.save_roster(&users).await?;

        self.store
            .set_metadata(META_LAST_SYNC, &now_rfc3339())
            .await?;
        self.store
            .set_metadata(META_LAST_SYNC_COUNT, &count.to_string())
            .await?;

        info!(count, "roster sync complete");
        Ok(count)
    }

    /// The view-activation trigger: load whatever is cached first, then
    /// sync only when a session is valid and the cache is stale. The
    /// caller always gets a roster to show; a failed sync rides along as
    /// an error indicator next to the stale data.
    pub async fn refresh_roster(&self) -> RosterRefresh {
        let users = self.cached_roster().await;

        let authenticated = self.auth.is_authenticated().await.unwrap_or(false);
        if !authenticated {
            return RosterRefresh {
                users,
                synced: false,
                sync_error: None,
            };
        }

        let due = self
            .is_sync_needed(self.max_age_minutes)
            .await
            .unwrap_or(true);
        if !due {
            return RosterRefresh {
                users,
                synced: false,
                sync_error: None,
            };
        }

        match self.sync_users().await {
            Ok(_) => RosterRefresh {
                users: self.cached_roster().await,
                synced: true,
                sync_error: None,
            },
            Err(sync_error) => {
                warn!(error = %sync_error, "sync failed; serving the cached roster");
                RosterRefresh {
                    users,
                    synced: false,
                    sync_error: Some(sync_error),
                }
            }
        }
    }

    /// Reachability probe for callers that want to hint at connectivity.
    pub async fn probe_server(&self) -> bool {
        self.api.health().await
    }

    /// Bookkeeping snapshot for status displays.
    pub async fn stats(&self) -> Result<SyncStats, StoreError> {
        self.store.sync_stats().await
    }

    /// The resilient read path: a storage failure here is logged as an
    /// error (distinct from an empty cache) and degrades to an empty
    /// roster instead of propagating.
    async fn cached_roster(&self) -> Vec<CachedUser> {
        match self.store.all_users().await {
            Ok(users) => users,
            Err(err) => {
                error!(error = %err, "roster load failed; serving an empty list");
                Vec::new()
            }
        }
    }
}

/// 401-class responses mean the session is no longer honored and the
/// caller should prompt a re-login; everything else is connectivity.
fn classify_failure(error: ApiClientError) -> SyncError {
    match error {
        ApiClientError::Status {
            status: 401 | 403,
            message,
        } => SyncError::AuthExpired { message },
        other => SyncError::Connectivity {
            reason: other.to_string(),
        },
    }
}
