//! HTTP client for the authoritative server

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::common::error::ApiClientError;
use crate::common::helpers::{safe_email_log, safe_token_log};
use crate::remote::models::{ErrorBody, LoginResponse, RemoteUser};

/// Client for the remote authentication and roster endpoints.
pub struct RosterApi {
    http: Client,
    base_url: String,
}

impl RosterApi {
    /// `timeout` bounds every request end to end; a hung server turns
    /// into an `Unreachable` error instead of an indefinite wait.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /api/login`: verify credentials against the server.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiClientError> {
        debug!(email = %safe_email_log(email), "posting credentials to /api/login");

        let response = self
            .http
            .post(self.url("/api/login"))
            .header(ACCEPT, "application/json")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::require_success(response).await?;
        response
            .json::<LoginResponse>()
            .await
            .map_err(|e| ApiClientError::Malformed(e.to_string()))
    }

    /// `POST /api/logout`: best-effort server-side session teardown.
    pub async fn logout(&self, token: &str) -> Result<(), ApiClientError> {
        debug!(token = %safe_token_log(token), "notifying /api/logout");

        let response = self
            .http
            .post(self.url("/api/logout"))
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        Self::require_success(response).await.map(|_| ())
    }

    /// `GET /api/me`: refresh the authenticated user's record.
    pub async fn me(&self, token: &str) -> Result<RemoteUser, ApiClientError> {
        let response = self
            .http
            .get(self.url("/api/me"))
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::require_success(response).await?;
        response
            .json::<RemoteUser>()
            .await
            .map_err(|e| ApiClientError::Malformed(e.to_string()))
    }

    /// `GET /api/users`: pull the full roster.
    pub async fn fetch_users(&self, token: &str) -> Result<Vec<RemoteUser>, ApiClientError> {
        let response = self
            .http
            .get(self.url("/api/users"))
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::require_success(response).await?;
        response
            .json::<Vec<RemoteUser>>()
            .await
            .map_err(|e| ApiClientError::Malformed(e.to_string()))
    }

    /// `GET /api/health`: reachability probe. Cooperative polling owned
    /// by the caller; the client never probes on its own.
    pub async fn health(&self) -> bool {
        match self.http.get(self.url("/api/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!(error = %error, "health probe failed");
                false
            }
        }
    }

    async fn require_success(response: Response) -> Result<Response, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Error bodies carry a `message` field; fall back to the HTTP
        // reason phrase when the body is empty or not JSON.
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_default();
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            message
        };

        warn!(status = status.as_u16(), message = %message, "server rejected request");
        Err(ApiClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
