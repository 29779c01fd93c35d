// Authentication types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Access/refresh token pair issued by the Questrade login server.
///
/// Serialized as JSON into the credential store. Unknown fields are ignored
/// on read so older or newer blobs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    pub api_server: String,

    /// Unset only when the provider reported a non-positive `expires_in`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl TokenPair {
    /// Serialize for the credential store
    pub fn to_json(&self) -> Result<String, AuthError> {
        serde_json::to_string(self).map_err(|e| AuthError::MalformedCredential(e.to_string()))
    }

    /// Parse a stored blob, rejecting partially populated pairs
    pub fn from_json(raw: &str) -> Result<Self, AuthError> {
        let pair: TokenPair = serde_json::from_str(raw)
            .map_err(|e| AuthError::MalformedCredential(e.to_string()))?;

        if let Some(field) = pair.empty_field() {
            return Err(AuthError::MalformedCredential(format!(
                "stored token has empty {}",
                field
            )));
        }

        Ok(pair)
    }

    /// First required field that is empty, if any
    fn empty_field(&self) -> Option<&'static str> {
        [
            ("access_token", &self.access_token),
            ("token_type", &self.token_type),
            ("refresh_token", &self.refresh_token),
            ("api_server", &self.api_server),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
    }

    /// True iff more than `skew` remains before expiry
    pub fn is_valid(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        match self.expiry {
            None => false,
            Some(exp) => exp - now > skew,
        }
    }

    /// Time left before expiry, negative once expired
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expiry.map(|exp| exp - now)
    }

    /// Check if token is actually expired (not just expiring soon)
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            None => true,
            Some(exp) => exp <= now,
        }
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Questrade token endpoint response
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub refresh_token: String,
    pub api_server: String,
}

impl RefreshResponse {
    /// Build the pair to persist, anchoring expiry at `now`.
    ///
    /// Fails with `InvalidResponse` when a field is empty or the lifetime
    /// does not fit in a timestamp, so nothing unloadable is ever stored.
    pub fn into_token_pair(self, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        let expiry = if self.expires_in > 0 {
            let expiry = Duration::try_seconds(self.expires_in)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .ok_or_else(|| {
                    AuthError::InvalidResponse(format!(
                        "expires_in {} is out of range",
                        self.expires_in
                    ))
                })?;
            Some(expiry)
        } else {
            tracing::warn!(
                expires_in = self.expires_in,
                "Login server returned a non-positive expires_in, token has no expiry"
            );
            None
        };

        let pair = TokenPair {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token,
            api_server: self.api_server,
            expiry,
        };

        if let Some(field) = pair.empty_field() {
            return Err(AuthError::InvalidResponse(format!(
                "response has empty {}",
                field
            )));
        }

        Ok(pair)
    }
}

/// Result of an authenticate call
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Stored token already matched and was fresh; no exchange happened
    AlreadyFresh(TokenPair),

    /// A new pair was minted and persisted
    Refreshed(TokenPair),
}

impl AuthOutcome {
    pub fn into_token(self) -> TokenPair {
        match self {
            AuthOutcome::AlreadyFresh(t) | AuthOutcome::Refreshed(t) => t,
        }
    }

    pub fn was_refreshed(&self) -> bool {
        matches!(self, AuthOutcome::Refreshed(_))
    }
}
