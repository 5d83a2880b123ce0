//! Top live streamers from the Helix `streams` endpoint.

use crate::client::TwitchClient;
use crate::config::Credentials;
use crate::error::{Result, TwitchError};
use crate::response::StreamsPage;
use crate::tracker::RequestKind;
use tracing::{debug, info};

/// Largest page the streams endpoint will return.
pub const TWITCH_PAGE_SIZE: usize = 100;

impl TwitchClient {
    /// Get the `count` top streams currently live on Twitch, by login.
    ///
    /// The endpoint is paginated, so this makes `ceil(count / 100)`
    /// sequential requests, each one feeding the previous page's cursor
    /// into the next.
    ///
    /// The remaining count is reduced by the size that was *requested*, so
    /// the number of requests is fixed up front. Twitch sometimes returns a
    /// slightly short page, in which case the result is shorter than
    /// `count`. Streams can also shift between pages while paging, so the
    /// result may contain duplicates at page borders; they are not removed.
    ///
    /// # Errors
    ///
    /// Fails with [`TwitchError::Api`] as soon as a page carries an error
    /// message, and with the underlying error on transport or decode
    /// failures. Pages already fetched are discarded in both cases.
    pub async fn get_top_streamers(
        &self,
        credentials: &Credentials,
        count: usize,
    ) -> Result<Vec<String>> {
        info!(count, "Getting top live streams from Twitch");

        let url = self.streams_url();
        let mut result = Vec::with_capacity(count.min(TWITCH_PAGE_SIZE));
        let mut cursor = String::new();
        let mut remaining = count;

        while remaining != 0 {
            let batch = remaining.min(TWITCH_PAGE_SIZE);
            remaining -= batch;

            debug!(
                batch,
                batches_left = remaining.div_ceil(TWITCH_PAGE_SIZE),
                "Requesting a batch of top streamers"
            );

            let request = self
                .get(&url)
                .header("Client-ID", &credentials.client_id)
                .bearer_auth(&credentials.access_token)
                .query(&[("first", batch.to_string()), ("after", cursor.clone())]);

            let body = self.send_json(RequestKind::Streams, request).await?;
            let page = StreamsPage::from_body(body)?;

            let next_cursor = page.pagination.cursor.clone();
            result.extend(page.logins());

            match next_cursor {
                Some(next) => cursor = next,
                None if remaining != 0 => return Err(TwitchError::MissingCursor),
                None => {}
            }
        }

        debug!(requested = count, received = result.len(), "Fetched top streamers");

        Ok(result)
    }
}
