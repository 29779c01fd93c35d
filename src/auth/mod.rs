// Authentication module
// Manages token lifecycle and credential storage

mod credentials;
mod manager;
mod refresh;
mod types;

pub use credentials::{
    CredentialId, CredentialStore, KeyringStore, MemoryStore, SERVICE_NAME, TOKEN_ENTRY,
};
pub use manager::{load_token, Authenticator, TokenRefresher};
pub use refresh::QUESTRADE_LOGIN_URL;
pub use types::{AuthOutcome, TokenPair};
