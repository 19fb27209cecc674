//! Local persistent store service

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::common::error::StoreError;
use crate::common::helpers::{format_rfc3339, now_rfc3339};
use crate::common::migrations::run_migrations;
use crate::store::models::{AuthToken, CachedUser, SyncStats};
use crate::store::{META_CURRENT_USER_ID, META_LAST_SYNC, META_LAST_SYNC_COUNT};

/// Durable storage for cached users, session tokens and sync metadata.
///
/// The underlying pool is created lazily on first use and exactly once:
/// concurrent first callers all await the same connection + schema
/// attempt rather than racing to open duplicate handles.
#[derive(Debug)]
pub struct LocalStore {
    database_url: String,
    pool: OnceCell<SqlitePool>,
}

impl LocalStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&SqlitePool, StoreError> {
        self.pool
            .get_or_try_init(|| Self::connect(&self.database_url))
            .await
            .map_err(StoreError::Unavailable)
    }

    async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // WAL gives concurrent readers a consistent snapshot while a
        // roster replacement commits. Memory databases only support their
        // own journal mode.
        let in_memory = database_url.contains(":memory:");
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // A second connection to a :memory: URL would open a second,
        // empty database.
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        info!(database_url, "local store initialized");
        Ok(pool)
    }

    /// Atomically replaces the entire cached roster and returns the
    /// number of records inserted.
    ///
    /// Named side effect: every stored token is deleted first (the token
    /// table references `users`), **including the current session's**. A
    /// caller that needs its session to survive a sync must re-issue or
    /// re-persist its token after this returns; nothing here preserves it.
    pub async fn save_roster(&self, users: &[CachedUser]) -> Result<u64, StoreError> {
        let pool = self.pool().await?;
        let now = now_rfc3339();

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM auth_tokens").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM users").execute(&mut *tx).await?;

        for user in users {
            sqlx::query(
                r#"
                INSERT INTO users
                (id, username, email, organization, password_hash,
                 offline_enabled, created_at, updated_at, last_login_at, last_sync_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.organization)
            .bind(&user.password_hash)
            .bind(user.offline_enabled)
            .bind(user.created_at.as_deref().unwrap_or(&now))
            .bind(user.updated_at.as_deref().unwrap_or(&now))
            .bind(&user.last_login_at)
            .bind(user.last_sync_at.as_deref().unwrap_or(&now))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            count = users.len(),
            "roster replaced; all cached tokens invalidated"
        );
        Ok(users.len() as u64)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<CachedUser>, StoreError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, CachedUser>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<CachedUser>, StoreError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, CachedUser>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Full cached roster, newest accounts first.
    pub async fn all_users(&self) -> Result<Vec<CachedUser>, StoreError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, CachedUser>("SELECT * FROM users ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Partial update of one cached user's mutable fields. `id` and
    /// `email` are never changed; `updated_at` is stamped here.
    pub async fn update_user(&self, user: &CachedUser) -> Result<(), StoreError> {
        let pool = self.pool().await?;
        sqlx::query(
            r#"
            UPDATE users SET
                username = ?,
                organization = ?,
                offline_enabled = ?,
                updated_at = ?,
                last_login_at = ?,
                last_sync_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.organization)
        .bind(user.offline_enabled)
        .bind(now_rfc3339())
        .bind(&user.last_login_at)
        .bind(&user.last_sync_at)
        .bind(user.id)
        .execute(pool)
        .await?;

        debug!(user_id = user.id, "cached user updated");
        Ok(())
    }

    /// Inserts or refreshes a single cached user outside a full roster
    /// sync (used when a login response carries the authoritative record).
    /// An existing cached password hash survives a response that omits
    /// one, so a later offline login still has something to verify
    /// against.
    pub async fn upsert_user(&self, user: &CachedUser) -> Result<(), StoreError> {
        let pool = self.pool().await?;
        let now = now_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO users
            (id, username, email, organization, password_hash,
             offline_enabled, created_at, updated_at, last_login_at, last_sync_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                username = excluded.username,
                email = excluded.email,
                organization = excluded.organization,
                password_hash = COALESCE(excluded.password_hash, users.password_hash),
                offline_enabled = excluded.offline_enabled,
                updated_at = excluded.updated_at,
                last_login_at = excluded.last_login_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.organization)
        .bind(&user.password_hash)
        .bind(user.offline_enabled)
        .bind(user.created_at.as_deref().unwrap_or(&now))
        .bind(&now)
        .bind(&user.last_login_at)
        .bind(&user.last_sync_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Upserts a metadata entry; values are replaced, never appended.
    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let pool = self.pool().await?;
        sqlx::query("INSERT OR REPLACE INTO sync_metadata (key, value, timestamp) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(now_rfc3339())
            .execute(pool)
            .await?;

        debug!(key, value, "sync metadata updated");
        Ok(())
    }

    pub async fn metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let pool = self.pool().await?;
        let row = sqlx::query_as::<_, (String,)>("SELECT value FROM sync_metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    /// Inserts a new token row with an expiry computed from `ttl_secs`.
    pub async fn save_token(
        &self,
        user_id: i64,
        token: &str,
        token_type: &str,
        ttl_secs: i64,
    ) -> Result<(), StoreError> {
        let pool = self.pool().await?;
        let now = chrono::Utc::now();
        let expires_at = format_rfc3339(now + chrono::Duration::seconds(ttl_secs));

        sqlx::query(
            r#"
            INSERT INTO auth_tokens (user_id, token, token_type, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(token_type)
        .bind(&expires_at)
        .bind(format_rfc3339(now))
        .execute(pool)
        .await?;

        debug!(user_id, expires_at = %expires_at, "session token stored");
        Ok(())
    }

    /// Newest non-expired token for the user, or `None`. Expiry is
    /// checked lazily here; there is no eviction timer.
    pub async fn valid_token(&self, user_id: i64) -> Result<Option<AuthToken>, StoreError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT * FROM auth_tokens
            WHERE user_id = ? AND expires_at > ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(now_rfc3339())
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Deletes every token whose expiry has passed; never touches a
    /// currently valid token. Safe to call at any time.
    pub async fn purge_expired_tokens(&self) -> Result<u64, StoreError> {
        let pool = self.pool().await?;
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= ?")
            .bind(now_rfc3339())
            .execute(pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            debug!(purged, "expired tokens removed");
        }
        Ok(purged)
    }

    /// Wipes every record collection. Mostly useful for tests and for a
    /// "remove account data" action in a consumer.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM auth_tokens").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM sync_metadata").execute(&mut *tx).await?;
        tx.commit().await?;

        warn!("all local data cleared");
        Ok(())
    }

    /// Sync bookkeeping snapshot for status displays.
    pub async fn sync_stats(&self) -> Result<SyncStats, StoreError> {
        let pool = self.pool().await?;

        let last_sync = self.metadata(META_LAST_SYNC).await?;
        let last_sync_count = self
            .metadata(META_LAST_SYNC_COUNT)
            .await?
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);

        let (user_count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        let authenticated = match self
            .metadata(META_CURRENT_USER_ID)
            .await?
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse::<i64>().ok())
        {
            Some(user_id) => self.valid_token(user_id).await?.is_some(),
            None => false,
        };

        Ok(SyncStats {
            last_sync,
            last_sync_count,
            user_count,
            authenticated,
        })
    }
}
