//! Configuration management for the Twitch viewer client.
//!
//! Supports configuration via CLI arguments, environment variables,
//! and JSON configuration files with sensible defaults.

use crate::error::{Result, TwitchError};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Number of top streamers fetched when no count is given.
pub const DEFAULT_STREAMER_COUNT: usize = 20;

/// CLI arguments for the Twitch viewer client.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "twitch-viewers",
    version,
    about = "Map Twitch's top live channels to their current chatters",
    long_about = "Fetches the top live streams from the Twitch Helix API and looks up the\n\
                  current chatters of every channel concurrently, printing a JSON report\n\
                  of channel -> viewers.",
    after_help = "EXAMPLES:\n    \
        twitch-viewers --client-id abc --access-token xyz --count 50\n    \
        twitch-viewers --channels shroud,xqc --output viewers.json\n    \
        twitch-viewers --config twitch.json --count 250 --json-logs"
)]
pub struct Args {
    /// Number of top live streamers to fetch
    #[arg(short = 'n', long, default_value_t = DEFAULT_STREAMER_COUNT, env = "TWITCH_COUNT")]
    pub count: usize,

    /// Look up these channels instead of fetching the top streamers (comma-separated)
    #[arg(short = 'C', long, value_delimiter = ',', env = "TWITCH_CHANNELS")]
    pub channels: Vec<String>,

    /// Twitch application client id
    #[arg(long, env = "TWITCH_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Twitch OAuth access token
    #[arg(long, env = "TWITCH_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Path to a JSON configuration file
    #[arg(short, long, env = "TWITCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to save the JSON report (defaults to stdout)
    #[arg(short, long, env = "TWITCH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file, 30 if neither sets it)
    #[arg(short, long, env = "TWITCH_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, env = "TWITCH_VERBOSE")]
    pub verbose: bool,

    /// Output logs as JSON
    #[arg(long, env = "TWITCH_JSON_LOGS")]
    pub json_logs: bool,

    /// Disable progress spinner
    #[arg(long, env = "TWITCH_NO_PROGRESS")]
    pub no_progress: bool,

    /// Dry run - validate config without sending requests
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Credentials for the Helix API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Application client id, sent as `Client-ID`.
    #[serde(rename = "client-id")]
    pub client_id: String,

    /// OAuth token, sent as `Authorization: Bearer <token>`.
    #[serde(rename = "access-token")]
    pub access_token: String,
}

impl Credentials {
    /// Create credentials from a client id and access token.
    pub fn new(client_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Helix credentials; only the streams endpoint needs them.
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Endpoint and HTTP settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// Endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Helix API, without a trailing slash.
    #[serde(default = "default_helix_base_url")]
    pub helix_base_url: String,

    /// Base URL of the TMI chatters service, without a trailing slash.
    #[serde(default = "default_tmi_base_url")]
    pub tmi_base_url: String,

    /// Request timeout.
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            helix_base_url: default_helix_base_url(),
            tmi_base_url: default_tmi_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_helix_base_url() -> String {
    "https://api.twitch.tv/helix".to_string()
}

fn default_tmi_base_url() -> String {
    "http://tmi.twitch.tv".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("twitch-viewers/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TwitchError::ConfigFileRead {
            path: path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(TwitchError::ConfigParse)
    }

    /// Create configuration from CLI arguments.
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = if let Some(config_path) = &args.config {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        // CLI and environment override the file
        if let Some(timeout) = args.timeout {
            config.api.timeout = Duration::from_secs(timeout);
        }

        if args.client_id.is_some() || args.access_token.is_some() {
            let existing = config.credentials.take();
            let client_id = args
                .client_id
                .clone()
                .or_else(|| existing.as_ref().map(|c| c.client_id.clone()));
            let access_token = args
                .access_token
                .clone()
                .or_else(|| existing.as_ref().map(|c| c.access_token.clone()));

            config.credentials = match (client_id, access_token) {
                (Some(id), Some(token)) => Some(Credentials::new(id, token)),
                _ => {
                    return Err(TwitchError::InvalidConfig(
                        "both a client id and an access token are required".to_string(),
                    ));
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api.helix_base_url.is_empty() || self.api.tmi_base_url.is_empty() {
            return Err(TwitchError::InvalidConfig(
                "API base URLs cannot be empty".to_string(),
            ));
        }

        if self.api.timeout.is_zero() {
            return Err(TwitchError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(credentials) = &self.credentials {
            if credentials.client_id.is_empty() || credentials.access_token.is_empty() {
                return Err(TwitchError::InvalidConfig(
                    "client id and access token cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Get the credentials, failing if none were configured.
    pub fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or(TwitchError::MissingCredentials)
    }
}

/// Custom serde module for humantime Duration parsing.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // "ms" has to be checked before "s"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        }
    }
}
