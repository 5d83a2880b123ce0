//! Request statistics for a client session.
//!
//! Every request a [`TwitchClient`](crate::TwitchClient) issues is recorded
//! here, split by endpoint, so a caller can report latency after a run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Which Twitch endpoint a request went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Helix `streams` page.
    Streams,
    /// TMI `chatters` lookup.
    Chatters,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streams => f.write_str("streams"),
            Self::Chatters => f.write_str("chatters"),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    success: AtomicU64,
    failure: AtomicU64,
    latency_us: AtomicU64,
}

impl Counters {
    fn load(&self) -> EndpointStats {
        EndpointStats {
            success_count: self.success.load(Ordering::Relaxed),
            failure_count: self.failure.load(Ordering::Relaxed),
            total_latency: Duration::from_micros(self.latency_us.load(Ordering::Relaxed)),
        }
    }
}

/// Statistics tracker shared by a client and all of its clones.
#[derive(Debug)]
pub struct StatsTracker {
    start_time: Instant,
    streams: Counters,
    chatters: Counters,
}

impl StatsTracker {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            streams: Counters::default(),
            chatters: Counters::default(),
        }
    }

    fn counters(&self, kind: RequestKind) -> &Counters {
        match kind {
            RequestKind::Streams => &self.streams,
            RequestKind::Chatters => &self.chatters,
        }
    }

    /// Record a request that produced a JSON body.
    pub fn record_success(&self, kind: RequestKind, latency: Duration) {
        let counters = self.counters(kind);
        counters.success.fetch_add(1, Ordering::Relaxed);
        counters
            .latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a request that failed in transport or decoding.
    pub fn record_failure(&self, kind: RequestKind) {
        self.counters(kind).failure.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            elapsed: self.start_time.elapsed(),
            streams: self.streams.load(),
            chatters: self.chatters.load(),
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts for one endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointStats {
    /// Requests that produced a JSON body.
    pub success_count: u64,
    /// Requests that failed.
    pub failure_count: u64,
    /// Summed latency of the successful requests.
    pub total_latency: Duration,
}

impl EndpointStats {
    /// Requests sent to this endpoint.
    pub fn requests(&self) -> u64 {
        self.success_count + self.failure_count
    }
}

/// A snapshot of current statistics.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    /// Elapsed time since the tracker was created.
    pub elapsed: Duration,
    /// Helix `streams` requests.
    pub streams: EndpointStats,
    /// TMI `chatters` requests.
    pub chatters: EndpointStats,
}

impl StatsSnapshot {
    /// Requests sent to either endpoint.
    pub fn total_requests(&self) -> u64 {
        self.streams.requests() + self.chatters.requests()
    }

    /// Failed requests on either endpoint.
    pub fn failure_count(&self) -> u64 {
        self.streams.failure_count + self.chatters.failure_count
    }

    /// Average latency of successful requests in milliseconds.
    pub fn avg_latency_ms(&self) -> f64 {
        let success = self.streams.success_count + self.chatters.success_count;
        if success == 0 {
            return 0.0;
        }
        let total = self.streams.total_latency + self.chatters.total_latency;
        total.as_secs_f64() * 1000.0 / success as f64
    }

    /// Format as a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Requests: {} (streams: {}, chatters: {}) | Failed: {} | \
             Avg Latency: {:.1}ms | Elapsed: {:.2}s",
            self.total_requests(),
            self.streams.requests(),
            self.chatters.requests(),
            self.failure_count(),
            self.avg_latency_ms(),
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_endpoint() {
        let tracker = StatsTracker::new();

        tracker.record_success(RequestKind::Streams, Duration::from_millis(50));
        tracker.record_success(RequestKind::Chatters, Duration::from_millis(100));
        tracker.record_failure(RequestKind::Chatters);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.total_requests(), 3);
        assert_eq!(snapshot.failure_count(), 1);
        assert_eq!(snapshot.streams.requests(), 1);
        assert_eq!(snapshot.chatters.requests(), 2);
        assert_eq!(snapshot.chatters.failure_count, 1);
        assert_eq!(snapshot.avg_latency_ms(), 75.0);
        assert!(snapshot.summary().contains("chatters: 2"));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = StatsTracker::default().snapshot();

        assert_eq!(snapshot.total_requests(), 0);
        assert_eq!(snapshot.streams, EndpointStats::default());
        assert_eq!(snapshot.avg_latency_ms(), 0.0);
    }
}
