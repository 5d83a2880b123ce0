//! Custom error types for the Twitch viewer client.
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for library errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to Twitch or loading configuration.
#[derive(Error, Debug)]
pub enum TwitchError {
    /// HTTP request failed, or its body could not be read.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// The streams endpoint answered with an error message.
    #[error("Twitch API error: {message}")]
    Api {
        /// The `message` field of the error body.
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("invalid API response: {message}")]
    InvalidResponse {
        /// Description of what was invalid.
        message: String,
    },

    /// A further page was needed but the previous one carried no cursor.
    #[error("streams response has no pagination cursor but more pages were requested")]
    MissingCursor,

    /// Failed to read the configuration file.
    #[error("failed to read config file '{path}': {source}")]
    ConfigFileRead {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for [`crate::Config`].
    #[error("failed to parse config file: {0}")]
    ConfigParse(#[source] serde_json::Error),

    /// Failed to write the report file.
    #[error("failed to write to output file '{path}': {source}")]
    OutputFileWrite {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON for output.
    #[error("failed to serialize JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The streams endpoint was needed but no credentials were configured.
    #[error("no Twitch credentials configured - client id and access token are required")]
    MissingCredentials,
}

/// Result type alias for Twitch operations.
pub type Result<T> = std::result::Result<T, TwitchError>;
