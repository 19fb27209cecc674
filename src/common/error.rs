// Error handling types for the client

/// Local persistence failures.
///
/// Device storage being absent or corrupt is non-retryable for the current
/// call; callers surface it rather than silently returning empty results.
/// The one exception is the roster view load in the sync coordinator,
/// which degrades to an empty list while logging the failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("local storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Failures at the remote API boundary, before they are classified for a
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("server unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed server response: {0}")]
    Malformed(String),
}

/// Authentication failures, mode-aware so a caller can present actionable
/// messaging (an account with offline login disabled reads differently
/// from a wrong password).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("server unreachable: {reason}")]
    NetworkUnavailable { reason: String },

    #[error("login rejected by server: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no cached account for this email; sign in online first")]
    UserNotFound,

    #[error("offline login is disabled for this account")]
    OfflineDisabled,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<ApiClientError> for AuthError {
    fn from(error: ApiClientError) -> Self {
        match error {
            // An unparsable body and an unreachable server both mean the
            // online path produced nothing usable; both trigger the
            // offline fallback.
            ApiClientError::Unreachable(e) => AuthError::NetworkUnavailable {
                reason: e.to_string(),
            },
            ApiClientError::Malformed(reason) => AuthError::NetworkUnavailable { reason },
            ApiClientError::Status { status, message } => AuthError::Rejected { status, message },
        }
    }
}

/// Roster synchronization failures. `AuthExpired` (401-class) tells the
/// caller a re-login prompt is in order; `Connectivity` does not.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("not authenticated; sign in before syncing")]
    AuthRequired,

    #[error("session rejected by server: {message}")]
    AuthExpired { message: String },

    #[error("roster endpoint unreachable: {reason}")]
    Connectivity { reason: String },

    #[error(transparent)]
    Storage(#[from] StoreError),
}
