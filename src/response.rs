//! Response payloads of the Helix streams and TMI chatters endpoints.

use crate::error::{Result, TwitchError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One page of `GET /helix/streams`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamsPage {
    /// Live streams on this page, highest viewer count first.
    pub data: Vec<LiveStream>,

    /// Cursor for the next page.
    #[serde(default)]
    pub pagination: Pagination,
}

/// A live stream entry. Only the fields this crate reads are decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStream {
    /// Lowercase login of the broadcaster.
    pub user_login: String,

    /// Current viewer count as reported by Helix.
    #[serde(default)]
    pub viewer_count: Option<u64>,
}

/// Pagination block of a Helix response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// Opaque cursor; absent on the last page.
    #[serde(default)]
    pub cursor: Option<String>,
}

impl StreamsPage {
    /// Decode a streams body.
    ///
    /// Only error bodies carry a `message` field, so its presence fails the
    /// page with [`TwitchError::Api`] before the data is looked at.
    pub fn from_body(body: Value) -> Result<Self> {
        if let Some(message) = body.get("message").filter(|m| !m.is_null()) {
            let message = message
                .as_str()
                .map_or_else(|| message.to_string(), str::to_string);
            return Err(TwitchError::Api { message });
        }

        serde_json::from_value(body).map_err(|e| TwitchError::InvalidResponse {
            message: format!("malformed streams page: {e}"),
        })
    }

    /// Logins of every stream on the page, in page order.
    pub fn logins(self) -> impl Iterator<Item = String> {
        self.data.into_iter().map(|stream| stream.user_login)
    }
}

/// Body of `GET /group/user/<channel>/chatters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChattersResponse {
    /// Chatters grouped by role (`broadcaster`, `moderators`, `viewers`, ...).
    pub chatters: BTreeMap<String, Vec<String>>,
}

impl ChattersResponse {
    /// Decode a chatters body.
    pub fn from_body(body: Value) -> Result<Self> {
        serde_json::from_value(body).map_err(|e| TwitchError::InvalidResponse {
            message: format!("malformed chatters response: {e}"),
        })
    }

    /// Every chatter of every role group, group order preserved.
    pub fn into_viewers(self) -> Vec<String> {
        self.chatters.into_values().flatten().collect()
    }
}
