use chrono::{Duration, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response, Url};
use std::sync::Arc;

use crate::auth::{load_token, CredentialStore, TokenPair, TokenRefresher};
use crate::config::Config;
use crate::error::AuthError;

/// HTTP client for the Questrade API.
///
/// Every call re-reads the stored token, refreshes it through the
/// [`TokenRefresher`] when it is about to expire, and only then dispatches.
/// There is no retry loop: failures go straight back to the caller.
pub struct QuestradeHttpClient {
    /// Shared HTTP client
    client: Client,

    /// Source of the current token pair
    store: Arc<dyn CredentialStore>,

    /// Mints a new token pair when the stored one is expiring
    refresher: Arc<dyn TokenRefresher>,

    /// Configured refresh token, preferred over the stored one
    refresh_token: Option<String>,

    user_agent: String,

    /// Refresh when no more than this much lifetime remains
    refresh_skew: Duration,
}

impl QuestradeHttpClient {
    pub fn new(
        config: &Config,
        client: Client,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        Self {
            client,
            store,
            refresher,
            refresh_token: config.refresh_token.clone(),
            user_agent: config.user_agent.clone(),
            refresh_skew: config.refresh_skew,
        }
    }

    /// Return a usable token pair, refreshing it first if it expires within
    /// the refresh skew
    pub async fn ensure_fresh(&self) -> Result<TokenPair, AuthError> {
        let token = load_token(self.store.as_ref())?.ok_or(AuthError::NotAuthenticated)?;

        if token.is_valid(Utc::now(), self.refresh_skew) {
            return Ok(token);
        }

        tracing::debug!(
            remaining_secs = ?token.time_until_expiry(Utc::now()).map(|d| d.num_seconds()),
            "Access token expiring soon, refreshing..."
        );

        // Questrade rotates refresh tokens, so the stored one is the latest
        let refresh_token = self
            .refresh_token
            .as_deref()
            .unwrap_or(token.refresh_token.as_str());

        let refreshed = self
            .refresher
            .authenticate(refresh_token)
            .await
            .map_err(|e| {
                tracing::error!("Token refresh failed: {}", e);
                AuthError::RefreshFailed(Box::new(e))
            })?
            .into_token();

        if refreshed.is_expired(Utc::now()) {
            tracing::error!(expiry = ?refreshed.expiry, "Refreshed token is already expired");
            return Err(AuthError::StillExpired);
        }

        Ok(refreshed)
    }

    /// Send an authenticated request to `<api_server>/<path...>?<query>`.
    ///
    /// Path segments and query values are percent-encoded. The response is
    /// returned as-is; status handling belongs to the caller.
    pub async fn request(
        &self,
        method: Method,
        path: &[&str],
        query: &[(&str, String)],
        body: Option<String>,
    ) -> Result<Response, AuthError> {
        let token = self.ensure_fresh().await?;
        let url = endpoint_url(&token.api_server, path, query)?;

        tracing::debug!(
            method = %method,
            url = %url,
            "Sending Questrade request"
        );

        let mut builder = self
            .client
            .request(method, url.clone())
            .header(AUTHORIZATION, token.authorization())
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(
                error = %e,
                url = %url,
                timeout = e.is_timeout(),
                connect = e.is_connect(),
                "Questrade request failed"
            );
            AuthError::Transport(e)
        })?;

        tracing::debug!(status = %response.status(), "Received Questrade response");

        Ok(response)
    }

    /// Authenticated GET
    pub async fn get(&self, path: &[&str], query: &[(&str, String)]) -> Result<Response, AuthError> {
        self.request(Method::GET, path, query, None).await
    }
}

/// Resolve an endpoint against the `api_server` of the stored token
fn endpoint_url(api_server: &str, path: &[&str], query: &[(&str, String)]) -> Result<Url, AuthError> {
    let mut url = Url::parse(api_server).map_err(|e| {
        AuthError::MalformedCredential(format!("invalid api_server {:?}: {}", api_server, e))
    })?;

    url.path_segments_mut()
        .map_err(|_| {
            AuthError::MalformedCredential(format!("api_server {:?} cannot be a base URL", api_server))
        })?
        .pop_if_empty()
        .extend(path);

    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }

    Ok(url)
}
