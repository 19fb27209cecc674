//! Wire models for the server API

use serde::{Deserialize, Serialize};

use crate::common::helpers::now_rfc3339;
use crate::store::models::CachedUser;

/// A user record as the server sends it. The roster endpoint includes the
/// bcrypt `password_hash` for accounts allowed to verify offline; the
/// login and profile endpoints may omit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default = "default_offline_enabled")]
    pub offline_enabled: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub last_login_at: Option<String>,
}

fn default_offline_enabled() -> bool {
    true
}

/// `POST /api/login` success body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: RemoteUser,
    pub access_token: String,
}

/// Error body shape shared by all endpoints on non-2xx.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

impl From<RemoteUser> for CachedUser {
    fn from(user: RemoteUser) -> Self {
        CachedUser {
            id: user.id,
            username: user.username,
            email: user.email,
            organization: user.organization,
            password_hash: user.password_hash,
            offline_enabled: i64::from(user.offline_enabled),
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login_at: user.last_login_at,
            last_sync_at: Some(now_rfc3339()),
        }
    }
}
