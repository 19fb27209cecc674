//! Authentication data models

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::common::helpers::now_rfc3339;
use crate::store::models::CachedUser;

/// How the active session was established. Regaining connectivity never
/// upgrades `Offline` to `Online`; only a fresh login does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    Online,
    Offline,
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMode::Online => write!(f, "online"),
            LoginMode::Offline => write!(f, "offline"),
        }
    }
}

/// Successful login result handed to callers.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub user: CachedUser,
    pub token: String,
    pub mode: LoginMode,
}

/// The in-memory session shortcut. A cache over the store, populated on
/// successful login/lookup and cleared on logout; the store remains the
/// source of truth for validity checks.
#[derive(Debug, Clone)]
pub(crate) struct ActiveSession {
    pub user: CachedUser,
    pub token: String,
    pub mode: LoginMode,
}

pub const OFFLINE_TOKEN_PREFIX: &str = "offline_";

/// Payload of a locally synthesized session token. A session marker for
/// this device only, not a portable credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineTokenPayload {
    pub user_id: i64,
    pub email: String,
    pub issued_at: String,
    pub mode: String,
}

impl OfflineTokenPayload {
    pub fn issue(user: &CachedUser) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            issued_at: now_rfc3339(),
            mode: "offline".to_string(),
        }
    }

    /// `offline_` + base64-encoded JSON payload.
    pub fn encode(&self) -> String {
        let payload = serde_json::json!({
            "user_id": self.user_id,
            "email": self.email,
            "issued_at": self.issued_at,
            "mode": self.mode,
        });
        format!("{OFFLINE_TOKEN_PREFIX}{}", BASE64.encode(payload.to_string()))
    }

    pub fn decode(token: &str) -> Option<Self> {
        let encoded = token.strip_prefix(OFFLINE_TOKEN_PREFIX)?;
        let bytes = BASE64.decode(encoded).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}
