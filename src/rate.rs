use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Advisory sliding-window counter for upstream API quotas, keyed by
/// endpoint name.
///
/// State is per-process: in a horizontally scaled deployment each instance
/// counts independently, so the cap should leave headroom under the true
/// upstream quota. Callers check [`can_make_request`](Self::can_make_request)
/// before spending quota and decide how to react; nothing here blocks.
pub struct RateGuard {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateGuard {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// True if another request for `endpoint` would stay under the cap.
    pub fn can_make_request(&self, endpoint: &str) -> bool {
        let mut windows = self.lock();
        let timestamps = windows.entry(endpoint.to_string()).or_default();
        Self::prune(timestamps, self.window);
        timestamps.len() < self.max_requests
    }

    /// Record a request for `endpoint`. A request that would exceed the cap
    /// is silently not recorded.
    pub fn record_request(&self, endpoint: &str) {
        let mut windows = self.lock();
        let timestamps = windows.entry(endpoint.to_string()).or_default();
        Self::prune(timestamps, self.window);
        if timestamps.len() < self.max_requests {
            timestamps.push_back(Instant::now());
        }
    }

    /// Requests left for `endpoint` within the trailing window.
    pub fn remaining(&self, endpoint: &str) -> usize {
        let mut windows = self.lock();
        let timestamps = windows.entry(endpoint.to_string()).or_default();
        Self::prune(timestamps, self.window);
        self.max_requests.saturating_sub(timestamps.len())
    }

    fn prune(timestamps: &mut VecDeque<Instant>, window: Duration) {
        while timestamps.front().is_some_and(|t| t.elapsed() >= window) {
            timestamps.pop_front();
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }
}
