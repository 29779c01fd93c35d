// Token refresh logic

use reqwest::Client;

use super::types::RefreshResponse;
use crate::error::AuthError;

/// Default Questrade login server token endpoint
pub const QUESTRADE_LOGIN_URL: &str = "https://login.questrade.com/oauth2/token";

/// Exchange a refresh token for a new token pair.
///
/// Questrade takes the refresh token as a query parameter on a GET, unlike
/// the usual form POST. The refresh token is single use: a successful call
/// invalidates it and returns a replacement.
pub async fn exchange_refresh_token(
    client: &Client,
    token_url: &str,
    user_agent: &str,
    refresh_token: &str,
) -> Result<RefreshResponse, AuthError> {
    tracing::info!("Exchanging refresh token with Questrade login server...");

    let response = client
        .get(token_url)
        .query(&[
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .header("User-Agent", user_agent)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %body,
            "Questrade token exchange rejected"
        );
        return Err(AuthError::Authentication {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    // Field checks happen in `RefreshResponse::into_token_pair`
    serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse(e.to_string()))
}
