//! Per-host admission throttling.
//!
//! Each destination host gets one FIFO queue that releases at most one job
//! per fixed interval. This is a rate limiter, not a connection pool: the
//! permit is dropped once the job is admitted, so pacing never bounds how
//! many admitted calls are in flight at the same time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tokio::time::Instant;

/// Admission gate for a single host.
#[derive(Debug)]
pub struct HostThrottle {
    /// Single permit; waiters queue FIFO in arrival order.
    admission: Semaphore,
    last_release: AsyncMutex<Option<Instant>>,
    interval: Duration,
}

impl HostThrottle {
    fn new(interval: Duration) -> Self {
        Self {
            admission: Semaphore::new(1),
            last_release: AsyncMutex::new(None),
            interval,
        }
    }

    /// Wait for this job's admission slot. Returns once at least `interval`
    /// has passed since the previous admission.
    pub async fn admit(&self) {
        // the semaphore is owned by this struct and never closed
        let Ok(_permit) = self.admission.acquire().await else {
            return;
        };
        let mut last = self.last_release.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                log::debug!("throttle: holding next admission for {:?}", wait);
                // sleeping while holding the permit keeps the queue FIFO
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Lazily-created throttles, one per destination host.
#[derive(Debug)]
pub struct ThrottleMap {
    interval: Duration,
    hosts: Mutex<HashMap<String, Arc<HostThrottle>>>,
}

impl ThrottleMap {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    pub fn for_host(&self, host: &str) -> Arc<HostThrottle> {
        let mut hosts = self.hosts.lock();
        Arc::clone(
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(HostThrottle::new(self.interval))),
        )
    }

    #[cfg(test)]
    pub fn host_count(&self) -> usize {
        self.hosts.lock().len()
    }
}
