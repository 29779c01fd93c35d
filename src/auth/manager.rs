use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use std::sync::Arc;

use super::credentials::{CredentialId, CredentialStore};
use super::refresh;
use super::types::{AuthOutcome, TokenPair};
use crate::config::Config;
use crate::error::AuthError;

/// Narrow seam between the request gateway and token minting
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Make sure a usable token minted from `refresh_token` is stored
    async fn authenticate(&self, refresh_token: &str) -> Result<AuthOutcome, AuthError>;
}

/// Read the stored token pair.
///
/// `Ok(None)` when nothing is stored; `MalformedCredential` when the blob
/// cannot be decoded.
pub fn load_token(store: &dyn CredentialStore) -> Result<Option<TokenPair>, AuthError> {
    match store.get(CredentialId::TOKEN)? {
        None => Ok(None),
        Some(raw) => TokenPair::from_json(&raw).map(Some),
    }
}

/// Exchanges refresh tokens with the Questrade login server and keeps the
/// credential store up to date
pub struct Authenticator {
    /// HTTP client for refresh requests
    client: Client,

    /// Durable copy of the token pair
    store: Arc<dyn CredentialStore>,

    /// Login server token endpoint
    token_url: String,

    user_agent: String,

    /// Minimum remaining lifetime for a stored token to count as fresh
    refresh_skew: Duration,
}

impl Authenticator {
    pub fn new(config: &Config, client: Client, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            store,
            token_url: config.login_url.clone(),
            user_agent: config.user_agent.clone(),
            refresh_skew: config.refresh_skew,
        }
    }

    /// Currently stored token pair, if any
    pub fn stored_token(&self) -> Result<Option<TokenPair>, AuthError> {
        load_token(self.store.as_ref())
    }

    /// Exchange `refresh_token` unless the stored pair was minted from the
    /// same refresh token and is still fresh
    pub async fn authenticate(&self, refresh_token: &str) -> Result<AuthOutcome, AuthError> {
        match self.stored_token() {
            Ok(Some(stored))
                if stored.refresh_token == refresh_token
                    && stored.is_valid(Utc::now(), self.refresh_skew) =>
            {
                tracing::debug!(
                    expiry = ?stored.expiry,
                    "Stored token is still fresh, skipping refresh"
                );
                return Ok(AuthOutcome::AlreadyFresh(stored));
            }
            Ok(_) => {}
            Err(e @ AuthError::MalformedCredential(_)) => {
                tracing::warn!("Ignoring stored credential: {}", e);
            }
            Err(e) => return Err(e),
        }

        self.refresh(refresh_token).await.map(AuthOutcome::Refreshed)
    }

    /// Exchange `refresh_token` unconditionally and persist the result
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let data = refresh::exchange_refresh_token(
            &self.client,
            &self.token_url,
            &self.user_agent,
            refresh_token,
        )
        .await?;

        let token = data.into_token_pair(Utc::now())?;

        // Store is written only after the exchange fully succeeded
        self.store.set(CredentialId::TOKEN, &token.to_json()?)?;

        tracing::info!(
            api_server = %token.api_server,
            expires = ?token.expiry.map(|e| e.to_rfc3339()),
            "Token refreshed (token: {}...)",
            token_preview(&token.access_token)
        );

        Ok(token)
    }
}

/// Leading characters of a token, safe to log
fn token_preview(token: &str) -> String {
    token.chars().take(8).collect()
}

#[async_trait]
impl TokenRefresher for Authenticator {
    async fn authenticate(&self, refresh_token: &str) -> Result<AuthOutcome, AuthError> {
        Authenticator::authenticate(self, refresh_token).await
    }
}
