//! Orchestrator counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking what the orchestrator did with the logical
/// requests it was handed.
#[derive(Debug, Default)]
pub struct RequestStats {
    physical_calls: AtomicU64,
    dedup_joins: AtomicU64,
    throttle_admissions: AtomicU64,
    rate_limit_retries: AtomicU64,
}

impl RequestStats {
    pub fn record_physical_call(&self) {
        self.physical_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dedup_join(&self) {
        self.dedup_joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_throttle_admission(&self) {
        self.throttle_admissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit_retry(&self) {
        self.rate_limit_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            physical_calls: self.physical_calls.load(Ordering::Relaxed),
            dedup_joins: self.dedup_joins.load(Ordering::Relaxed),
            throttle_admissions: self.throttle_admissions.load(Ordering::Relaxed),
            rate_limit_retries: self.rate_limit_retries.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Calls that reached the transport.
    pub physical_calls: u64,
    /// Logical requests answered by joining an in-flight call.
    pub dedup_joins: u64,
    /// Jobs released through a host throttle.
    pub throttle_admissions: u64,
    /// Transparent retries triggered by HTTP 429.
    pub rate_limit_retries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let stats = RequestStats::default();
        stats.record_physical_call();
        stats.record_physical_call();
        stats.record_dedup_join();
        stats.record_rate_limit_retry();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.physical_calls, 2);
        assert_eq!(snapshot.dedup_joins, 1);
        assert_eq!(snapshot.throttle_admissions, 0);
        assert_eq!(snapshot.rate_limit_retries, 1);
    }
}
