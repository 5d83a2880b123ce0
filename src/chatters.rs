//! Current viewers of a channel from the TMI chatters endpoint.
//!
//! `tmi.twitch.tv` is not part of the documented Helix API. It needs no
//! credentials and has no pagination.

use crate::client::TwitchClient;
use crate::error::Result;
use crate::response::ChattersResponse;
use crate::tracker::RequestKind;
use tracing::debug;

impl TwitchClient {
    /// Get the current viewers of `channel`.
    ///
    /// The channel name is lowercased before it goes into the URL. Chatters
    /// of every role group are merged into one list.
    pub async fn get_current_viewers(&self, channel: &str) -> Result<Vec<String>> {
        let url = self.chatters_url(&channel.to_lowercase());
        let body = self.send_json(RequestKind::Chatters, self.get(&url)).await?;
        let viewers = ChattersResponse::from_body(body)?.into_viewers();

        debug!(channel, viewers = viewers.len(), "Got viewers");

        Ok(viewers)
    }
}
