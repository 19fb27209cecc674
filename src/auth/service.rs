//! Authentication manager

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::auth::models::{ActiveSession, LoginMode, LoginSuccess, OfflineTokenPayload};
use crate::auth::password::verify_cached_password;
use crate::common::error::{AuthError, StoreError};
use crate::common::helpers::{now_rfc3339, safe_email_log, safe_token_log};
use crate::remote::client::RosterApi;
use crate::remote::models::LoginResponse;
use crate::store::models::CachedUser;
use crate::store::service::LocalStore;
use crate::store::{META_CURRENT_USER_ID, META_OFFLINE_MODE};

/// Dual-path authentication: remote credential verification first, local
/// hash-verified fallback when the server can't be used.
///
/// Holds the one in-memory user/token shortcut; every validity decision
/// still goes through the store so a restarted process reaches the same
/// answers.
pub struct AuthService {
    store: Arc<LocalStore>,
    api: Arc<RosterApi>,
    token_ttl_secs: i64,
    session: RwLock<Option<ActiveSession>>,
}

impl AuthService {
    pub fn new(store: Arc<LocalStore>, api: Arc<RosterApi>, token_ttl_secs: i64) -> Self {
        Self {
            store,
            api,
            token_ttl_secs,
            session: RwLock::new(None),
        }
    }

    /// Attempts the online path, falling back to cached-credential
    /// verification on any online failure (unreachable, non-2xx,
    /// malformed body). When both paths fail the **online** error is
    /// surfaced (its message is the more actionable one) and the
    /// offline failure is only logged.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        match self.api.login(email, password).await {
            Ok(response) => {
                info!(email = %safe_email_log(email), "online login accepted");
                self.complete_online_login(response).await
            }
            Err(online_error) => {
                let online_error = AuthError::from(online_error);
                warn!(
                    email = %safe_email_log(email),
                    error = %online_error,
                    "online login failed; trying cached credentials"
                );
                let offline = self.offline_login(email, password).await;
                resolve_fallback(online_error, offline)
            }
        }
    }

    async fn complete_online_login(
        &self,
        response: LoginResponse,
    ) -> Result<LoginSuccess, AuthError> {
        let mut user: CachedUser = response.user.into();
        user.last_login_at = Some(now_rfc3339());

        // The token row references the user row, so the user must be
        // cached first even on a fresh install.
        self.store.upsert_user(&user).await?;
        self.store
            .save_token(user.id, &response.access_token, "bearer", self.token_ttl_secs)
            .await?;
        self.store
            .set_metadata(META_CURRENT_USER_ID, &user.id.to_string())
            .await?;
        self.store.set_metadata(META_OFFLINE_MODE, "false").await?;

        *self.session.write().await = Some(ActiveSession {
            user: user.clone(),
            token: response.access_token.clone(),
            mode: LoginMode::Online,
        });

        Ok(LoginSuccess {
            user,
            token: response.access_token,
            mode: LoginMode::Online,
        })
    }

    /// The offline path: look up the cached account, check its offline
    /// flag, verify the password against the cached hash, then synthesize
    /// and persist a local session token.
    pub(crate) async fn offline_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginSuccess, AuthError> {
        let Some(mut user) = self.store.user_by_email(email).await? else {
            return Err(AuthError::UserNotFound);
        };

        if !user.offline_login_enabled() {
            return Err(AuthError::OfflineDisabled);
        }

        let Some(hash) = user.password_hash.as_deref() else {
            warn!(
                email = %safe_email_log(email),
                "cached account has no password hash; offline verification impossible"
            );
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_cached_password(password, hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = OfflineTokenPayload::issue(&user).encode();
        user.last_login_at = Some(now_rfc3339());
        self.store.update_user(&user).await?;
        self.store
            .save_token(user.id, &token, "bearer", self.token_ttl_secs)
            .await?;
        self.store
            .set_metadata(META_CURRENT_USER_ID, &user.id.to_string())
            .await?;
        self.store.set_metadata(META_OFFLINE_MODE, "true").await?;

        *self.session.write().await = Some(ActiveSession {
            user: user.clone(),
            token: token.clone(),
            mode: LoginMode::Offline,
        });

        info!(user_id = user.id, "offline login verified against cached credentials");
        Ok(LoginSuccess {
            user,
            token,
            mode: LoginMode::Offline,
        })
    }

    /// Clears the local session. The server notification (online mode
    /// only) is fire-and-forget: it runs on its own task and can hang or
    /// fail without delaying or failing the local clear.
    pub async fn logout(&self) -> Result<(), StoreError> {
        let session = self.session.write().await.take();

        let offline = self.is_offline_mode().await.unwrap_or(true);
        if !offline {
            let token = match session {
                Some(session) => Some(session.token),
                None => match self.current_user_id().await {
                    Ok(Some(user_id)) => self
                        .store
                        .valid_token(user_id)
                        .await
                        .ok()
                        .flatten()
                        .map(|t| t.token),
                    _ => None,
                },
            };
            if let Some(token) = token {
                let api = Arc::clone(&self.api);
                tokio::spawn(async move {
                    if let Err(error) = api.logout(&token).await {
                        warn!(
                            error = %error,
                            token = %safe_token_log(&token),
                            "server logout notification failed; local logout already completed"
                        );
                    }
                });
            }
        }

        self.store.set_metadata(META_CURRENT_USER_ID, "").await?;
        self.store.set_metadata(META_OFFLINE_MODE, "false").await?;

        if let Err(error) = self.store.purge_expired_tokens().await {
            warn!(error = %error, "expired-token purge failed during logout");
        }

        info!("logged out");
        Ok(())
    }

    /// True iff a current-user entry exists and the store still holds a
    /// non-expired token for it. Deliberately ignores the in-memory
    /// shortcut: the process may have restarted, and expiry is detected
    /// lazily here rather than by a timer.
    pub async fn is_authenticated(&self) -> Result<bool, StoreError> {
        let Some(user_id) = self.current_user_id().await? else {
            return Ok(false);
        };
        Ok(self.store.valid_token(user_id).await?.is_some())
    }

    /// The authenticated user: the in-memory copy when present, otherwise
    /// resolved from the store. In online mode the record is refreshed
    /// from `GET /api/me`, overwriting the cached copy on success and
    /// falling back to it on any failure.
    pub async fn current_user(&self) -> Result<Option<CachedUser>, StoreError> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(Some(session.user.clone()));
        }

        let Some(user_id) = self.current_user_id().await? else {
            return Ok(None);
        };
        let Some(mut user) = self.store.user_by_id(user_id).await? else {
            return Ok(None);
        };

        let offline = self.is_offline_mode().await?;
        let token = self.store.valid_token(user_id).await?;

        if !offline {
            if let Some(token) = token.as_ref() {
                match self.api.me(&token.token).await {
                    Ok(remote) => {
                        user.username = remote.username;
                        user.organization = remote.organization;
                        user.offline_enabled = i64::from(remote.offline_enabled);
                        self.store.update_user(&user).await?;
                    }
                    Err(error) => {
                        warn!(error = %error, "profile refresh failed; serving cached copy");
                    }
                }
            }
        }

        if let Some(token) = token {
            let mode = if offline {
                LoginMode::Offline
            } else {
                LoginMode::Online
            };
            *self.session.write().await = Some(ActiveSession {
                user: user.clone(),
                token: token.token,
                mode,
            });
        }

        Ok(Some(user))
    }

    /// `Authorization` header value for the current session, or `None`.
    pub async fn auth_header(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .bearer_token()
            .await?
            .map(|token| format!("Bearer {token}")))
    }

    /// The raw token for the current session. The in-memory shortcut is
    /// preferred; it is what keeps an offline session usable immediately
    /// after a roster sync wiped the stored token rows.
    pub(crate) async fn bearer_token(&self) -> Result<Option<String>, StoreError> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(Some(session.token.clone()));
        }

        let Some(user_id) = self.current_user_id().await? else {
            return Ok(None);
        };
        Ok(self.store.valid_token(user_id).await?.map(|t| t.token))
    }

    /// Whether the active session was established via the offline path.
    pub async fn is_offline_mode(&self) -> Result<bool, StoreError> {
        Ok(self
            .store
            .metadata(META_OFFLINE_MODE)
            .await?
            .as_deref()
            == Some("true"))
    }

    async fn current_user_id(&self) -> Result<Option<i64>, StoreError> {
        Ok(self
            .store
            .metadata(META_CURRENT_USER_ID)
            .await?
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse().ok()))
    }
}

/// Arbitration between the two login branches, separated from their I/O:
/// a successful fallback wins; a failed fallback is logged and the online
/// error is what the caller sees.
pub(crate) fn resolve_fallback(
    online_error: AuthError,
    offline: Result<LoginSuccess, AuthError>,
) -> Result<LoginSuccess, AuthError> {
    match offline {
        Ok(success) => Ok(success),
        Err(offline_error) => {
            error!(
                online = %online_error,
                offline = %offline_error,
                "both login paths failed; surfacing the online error"
            );
            Err(online_error)
        }
    }
}
