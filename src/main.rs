use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use dialoguer::Password;
use serde::Serialize;
use std::sync::Arc;

use lunchquest::api;
use lunchquest::auth::{AuthOutcome, Authenticator, CredentialStore, KeyringStore};
use lunchquest::config::{Command, Config};
use lunchquest::error::{ApiError, AuthError};
use lunchquest::http_client::QuestradeHttpClient;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;

    // Initialize logging with a configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Prompt before the deadline starts so typing doesn't count against it
    let command = match command {
        Command::Login {
            refresh_token: None,
        } => Command::Login {
            refresh_token: Some(prompt_refresh_token()?),
        },
        other => other,
    };

    let store: Arc<dyn CredentialStore> = Arc::new(KeyringStore::new());
    let http = config
        .http_client()
        .context("Failed to create HTTP client")?;
    let authenticator = Arc::new(Authenticator::new(&config, http.clone(), store.clone()));
    let client = QuestradeHttpClient::new(&config, http, store, authenticator.clone());

    let deadline = config.timeout_for(&command);
    let result = match tokio::time::timeout(
        deadline,
        run(command, &config, &authenticator, &client),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "Command timed out after {}s",
            deadline.as_secs()
        )),
    };

    if let Err(ref e) = result {
        if needs_login(e) {
            eprintln!("Run `lunchquest login -r <REFRESH_TOKEN>` with a token from the Questrade App Hub.");
        }
    }

    result
}

async fn run(
    command: Command,
    config: &Config,
    authenticator: &Authenticator,
    client: &QuestradeHttpClient,
) -> Result<()> {
    match command {
        Command::Login { refresh_token } => {
            let refresh_token = refresh_token.context("Refresh token is required")?;
            let outcome = authenticator
                .authenticate(&refresh_token)
                .await
                .context("Error during authentication")?;

            match outcome {
                AuthOutcome::AlreadyFresh(_) => println!("Already authenticated"),
                AuthOutcome::Refreshed(_) => println!("Successfully authenticated"),
            }
        }

        Command::Reauthenticate => {
            let refresh_token = match config.refresh_token.clone() {
                Some(token) => token,
                None => authenticator
                    .stored_token()?
                    .map(|t| t.refresh_token)
                    .ok_or(AuthError::NotAuthenticated)?,
            };

            authenticator
                .refresh(&refresh_token)
                .await
                .context("Failed to get new tokens")?;
            println!("Tokens updated successfully");
        }

        Command::Accounts => {
            let accounts = api::get_accounts(client)
                .await
                .context("Failed to get accounts")?;
            print_json(&accounts)?;
        }

        Command::Balances { account } => {
            let balances = api::get_balances(client, &account)
                .await
                .context("Failed to get account balances")?;
            print_json(&balances)?;
        }

        Command::Activities {
            account,
            start,
            end,
        } => {
            let end = match end {
                Some(s) => parse_time(&s)?,
                None => Utc::now().fixed_offset(),
            };
            let start = match start {
                Some(s) => parse_time(&s)?,
                None => end - Duration::days(30),
            };
            if start > end {
                anyhow::bail!("--start must not be after --end");
            }

            let activities = api::get_activities(client, &account, &start, &end)
                .await
                .context("Failed to get account activities")?;
            print_json(&activities)?;
        }
    }

    Ok(())
}

fn prompt_refresh_token() -> Result<String> {
    let token: String = Password::new()
        .with_prompt("Questrade refresh token")
        .interact()
        .context("Failed to read refresh token")?;

    if token.trim().is_empty() {
        anyhow::bail!("Refresh token cannot be empty");
    }

    Ok(token.trim().to_string())
}

fn parse_time(s: &str) -> Result<chrono::DateTime<chrono::FixedOffset>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid RFC 3339 timestamp: {}", s))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Whether the error chain says the stored credential is unusable
fn needs_login(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(auth) = cause.downcast_ref::<AuthError>() {
            return auth.requires_login();
        }
        matches!(cause.downcast_ref::<ApiError>(), Some(ApiError::Auth(auth)) if auth.requires_login())
    })
}
