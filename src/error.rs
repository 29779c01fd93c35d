// Error handling module
// Defines the error taxonomy for token management and API calls

use thiserror::Error;

/// Errors from the credential store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// OS secret store failure
    #[error("Keyring operation failed: {0}")]
    Keyring(#[from] keyring::Error),

    /// In-memory store lock was poisoned by a panicking test
    #[error("Credential store is unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while obtaining or using Questrade tokens
#[derive(Error, Debug)]
pub enum AuthError {
    /// No stored credential; the user must run `lunchquest login`
    #[error("Not authenticated: run `lunchquest login` first")]
    NotAuthenticated,

    /// Login server rejected the refresh token exchange
    #[error("Authentication failed: {status} - {body}")]
    Authentication { status: u16, body: String },

    /// Stored credential could not be decoded
    #[error("Stored credential is malformed: {0}")]
    MalformedCredential(String),

    /// Proactive refresh before an API call failed
    #[error("Failed to refresh token: {0}")]
    RefreshFailed(#[source] Box<AuthError>),

    /// Login server issued a token that is already expired
    #[error("Refreshed token is still expired")]
    StillExpired,

    /// Login server response body did not match the expected shape
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Network-level failure building or sending a request
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Whether the user has to log in again with a fresh refresh token
    pub fn requires_login(&self) -> bool {
        match self {
            AuthError::NotAuthenticated | AuthError::MalformedCredential(_) => true,
            AuthError::Authentication { status, .. } => matches!(status, 400 | 401),
            AuthError::RefreshFailed(inner) => inner.requires_login(),
            _ => false,
        }
    }
}

/// Errors returned by the account, balance and activity calls
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Questrade answered with a non-200 status
    #[error("Questrade API error: {status} - {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Failed to parse {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: reqwest::Error,
    },
}
