use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::auth::QUESTRADE_LOGIN_URL;

/// Lunchquest - Questrade API command-line client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Refresh token used when the stored access token needs renewing
    /// (defaults to the one saved by the last login)
    #[arg(long, env = "QUESTRADE_REFRESH_TOKEN", hide_env_values = true, global = true)]
    pub fallback_refresh_token: Option<String>,

    /// User-Agent sent with every Questrade request
    #[arg(long, env = "LUNCHQUEST_USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    /// Questrade login server token endpoint
    #[arg(long, env = "QUESTRADE_LOGIN_URL", default_value = QUESTRADE_LOGIN_URL, global = true)]
    pub login_url: String,

    /// Refresh when fewer than this many seconds of token lifetime remain
    #[arg(long, env = "TOKEN_REFRESH_SKEW", default_value = "60", global = true)]
    pub refresh_skew: i64,

    /// Deadline for the whole command in seconds (default: 180 for login, 30 otherwise)
    #[arg(long, env = "LUNCHQUEST_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30", global = true)]
    pub http_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Exchange a refresh token from the Questrade App Hub for API access
    Login {
        /// Refresh token; prompted for when omitted
        #[arg(short = 'r', long = "refresh-token")]
        refresh_token: Option<String>,
    },

    /// Force a token refresh using the stored or configured refresh token
    Reauthenticate,

    /// List accounts
    Accounts,

    /// Show balances for an account
    Balances {
        /// Account number
        account: String,
    },

    /// Show activities for an account in a date range
    Activities {
        /// Account number
        account: String,

        /// Start of the range (RFC 3339), defaults to 30 days ago
        #[arg(long)]
        start: Option<String>,

        /// End of the range (RFC 3339), defaults to now
        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    // Questrade endpoints
    pub login_url: String,
    pub user_agent: String,

    // Authentication
    pub refresh_token: Option<String>,
    pub refresh_skew: chrono::Duration,

    // Timeouts
    pub command_timeout: Option<Duration>,
    pub http_request_timeout: Duration,

    // Logging
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_url: QUESTRADE_LOGIN_URL.to_string(),
            user_agent: default_user_agent(),
            refresh_token: None,
            refresh_skew: chrono::Duration::seconds(60),
            command_timeout: None,
            http_request_timeout: Duration::from_secs(30),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Build configuration from parsed arguments (CLI > ENV > defaults)
    pub fn from_args(args: &CliArgs) -> Self {
        Config {
            login_url: args.login_url.clone(),
            user_agent: args
                .user_agent
                .clone()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(default_user_agent),
            refresh_token: args
                .fallback_refresh_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
            refresh_skew: chrono::Duration::seconds(args.refresh_skew),
            command_timeout: args.timeout.map(Duration::from_secs),
            http_request_timeout: Duration::from_secs(args.http_timeout),
            log_level: args.log_level.clone(),
        }
    }

    /// Load `.env`, parse the command line and build the configuration
    pub fn load() -> Result<(Self, Command)> {
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let config = Config::from_args(&args);
        config.validate()?;

        Ok((config, args.command))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.refresh_skew < chrono::Duration::zero() {
            anyhow::bail!("TOKEN_REFRESH_SKEW must not be negative");
        }

        if self.http_request_timeout.is_zero() {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        reqwest::Url::parse(&self.login_url)
            .with_context(|| format!("QUESTRADE_LOGIN_URL is not a valid URL: {}", self.login_url))?;

        Ok(())
    }

    /// Deadline for a command, falling back to the per-command default
    pub fn timeout_for(&self, command: &Command) -> Duration {
        self.command_timeout.unwrap_or(match command {
            Command::Login { .. } => Duration::from_secs(180),
            _ => Duration::from_secs(30),
        })
    }

    /// Shared HTTP client for login and API calls
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_request_timeout)
            .build()
    }
}

fn default_user_agent() -> String {
    format!("lunchquest-cli/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_login_flag() {
        let args = parse(&["lunchquest", "login", "-r", "R1"]);
        assert_eq!(
            args.command,
            Command::Login {
                refresh_token: Some("R1".to_string())
            }
        );
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = parse(&["lunchquest", "accounts", "--refresh-skew", "180"]);
        let config = Config::from_args(&args);
        assert_eq!(config.refresh_skew, chrono::Duration::seconds(180));
        assert_eq!(args.command, Command::Accounts);
    }

    #[test]
    fn test_blank_user_agent_falls_back_to_default() {
        let args = parse(&["lunchquest", "accounts", "--user-agent", "  "]);
        let config = Config::from_args(&args);
        assert!(config.user_agent.starts_with("lunchquest-cli/"));
    }

    #[test]
    fn test_timeout_defaults_per_command() {
        let config = Config::default();
        assert_eq!(
            config.timeout_for(&Command::Login {
                refresh_token: None
            }),
            Duration::from_secs(180)
        );
        assert_eq!(config.timeout_for(&Command::Accounts), Duration::from_secs(30));

        let config = Config {
            command_timeout: Some(Duration::from_secs(5)),
            ..Config::default()
        };
        assert_eq!(config.timeout_for(&Command::Reauthenticate), Duration::from_secs(5));
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            refresh_skew: chrono::Duration::seconds(-1),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            login_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
