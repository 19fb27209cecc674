// src/common/migrations.rs
//! Database schema management
//!
//! The schema is created idempotently on first connection; there is no
//! migration history to preserve because the server owns the data: a
//! wiped cache repopulates itself on the next roster sync.

use sqlx::SqlitePool;
use tracing::info;

/// Create all tables and indexes if they don't exist
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_core_tables(pool).await?;
    create_indexes(pool).await?;

    info!("local schema ready");

    Ok(())
}

async fn create_core_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Cached user roster, mirrored wholesale from the server.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            organization TEXT,
            password_hash TEXT,
            offline_enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT,
            updated_at TEXT,
            last_login_at TEXT,
            last_sync_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Free-standing key/value map for sync bookkeeping. Values are
    // replaced, never appended.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Session tokens, server-issued or locally synthesized. Rows cascade
    // away with their user.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS auth_tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            token TEXT NOT NULL,
            token_type TEXT NOT NULL DEFAULT 'bearer',
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_auth_tokens_user_expiry
         ON auth_tokens (user_id, expires_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
