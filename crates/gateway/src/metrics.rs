use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking submission, redemption and sweep outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Submissions that produced a grant.
    pub submissions_accepted: AtomicU64,
    /// Submissions dropped because a required field was missing or unusable.
    pub submissions_ignored: AtomicU64,
    /// Tokens redeemed and handed off for delivery.
    pub redemptions: AtomicU64,
    /// Claimed requests answered with not-found.
    pub rejections: AtomicU64,
    /// Completed sweep runs.
    pub sweeps: AtomicU64,
    /// Token entries removed by sweeps.
    pub tokens_swept: AtomicU64,
    /// Path entries removed by sweeps.
    pub paths_swept: AtomicU64,
}

impl GatewayMetrics {
    /// Increment the accepted submissions counter.
    pub fn increment_submissions_accepted(&self) {
        self.submissions_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the ignored submissions counter.
    pub fn increment_submissions_ignored(&self) {
        self.submissions_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the redemptions counter.
    pub fn increment_redemptions(&self) {
        self.redemptions.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the rejections counter.
    pub fn increment_rejections(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed sweep and the entries it removed.
    pub fn record_sweep(&self, tokens: u64, paths: u64) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.tokens_swept.fetch_add(tokens, Ordering::Relaxed);
        self.paths_swept.fetch_add(paths, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submissions_accepted: self.submissions_accepted.load(Ordering::Relaxed),
            submissions_ignored: self.submissions_ignored.load(Ordering::Relaxed),
            redemptions: self.redemptions.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            tokens_swept: self.tokens_swept.load(Ordering::Relaxed),
            paths_swept: self.paths_swept.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`GatewayMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub submissions_accepted: u64,
    pub submissions_ignored: u64,
    pub redemptions: u64,
    pub rejections: u64,
    pub sweeps: u64,
    pub tokens_swept: u64,
    pub paths_swept: u64,
}
