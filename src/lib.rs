//! # Twitch Viewers
//!
//! Async client for two read-only Twitch endpoints: the top live streams of
//! the Helix API, and the (undocumented) TMI chatters list of a channel.
//!
//! ## Features
//!
//! - **Top Streamers**: Paginated Helix `streams` requests with cursor threading
//! - **Viewer Lookup**: Every chatter of a channel, all role groups merged
//! - **Viewer Map**: Concurrent lookups over many channels, failures isolated per channel
//! - **Request Stats**: Latency and throughput of every request a client sends
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use twitch_viewers::{ApiConfig, Credentials, TwitchClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TwitchClient::new(ApiConfig::default())?;
//!     let credentials = Credentials::new("your-client-id", "your-access-token");
//!
//!     let streamers = client.get_top_streamers(&credentials, 50).await?;
//!     let viewers = client.get_viewer_map(&streamers).await;
//!
//!     for (channel, chatters) in viewers.iter() {
//!         println!("{channel}: {} viewers", chatters.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! The `twitch-viewers` binary reads configuration from:
//! - Command-line arguments
//! - Environment variables (prefixed with `TWITCH_`)
//! - JSON configuration files
//!
//! See [`Config`] for all available options.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chatters;
pub mod client;
pub mod config;
pub mod error;
pub mod response;
pub mod streams;
pub mod tracker;
pub mod viewer_map;

// Re-exports for convenience
pub use client::TwitchClient;
pub use config::{ApiConfig, Args, Config, Credentials, DEFAULT_STREAMER_COUNT};
pub use error::{Result, TwitchError};
pub use response::{ChattersResponse, LiveStream, Pagination, StreamsPage};
pub use streams::TWITCH_PAGE_SIZE;
pub use tracker::{EndpointStats, RequestKind, StatsSnapshot, StatsTracker};
pub use viewer_map::{ViewerMap, ViewerReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
