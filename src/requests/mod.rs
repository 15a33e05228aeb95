//! Request orchestration: throttling, deduplication and 429 retry.
//!
//! The orchestrator turns logical fetches into a bounded stream of physical
//! calls through an injected [`Transport`]. Requests carrying a body are
//! assumed to have distinct side effects: they are paced through a per-host
//! FIFO throttle and never deduplicated. Body-less requests are idempotent
//! reads: concurrent identical ones (same URL, same cancellation scope)
//! share a single physical call. Both paths transparently retry on HTTP 429,
//! honoring the server's `retry-after` when it parses.
//!
//! Throttle and dedup state live on the orchestrator instance, shared by
//! everything holding it; there are no module-level globals.

pub mod scope;
pub mod single_flight;
pub mod stats;
pub mod throttle;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult};
use crate::transport::{FetchRequest, FetchResponse, Transport};

pub use scope::CancelScope;
pub use stats::{RequestStats, StatsSnapshot};

use single_flight::SingleFlight;
use throttle::ThrottleMap;

/// HTTP status the server uses to signal backpressure.
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

pub struct RequestOrchestrator {
    transport: Arc<dyn Transport>,
    throttles: ThrottleMap,
    flights: SingleFlight,
    retry_delay: Duration,
    max_retry_attempts: Option<u32>,
    stats: Arc<RequestStats>,
}

impl RequestOrchestrator {
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            throttles: ThrottleMap::new(Duration::from_millis(config.throttle_interval_ms)),
            flights: SingleFlight::new(),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_retry_attempts: config.max_retry_attempts,
            stats: Arc::new(RequestStats::default()),
        }
    }

    pub fn with_defaults(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, &ClientConfig::default())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Run one logical request through the decision protocol.
    pub async fn execute(&self, request: FetchRequest) -> ClientResult<FetchResponse> {
        if request.body.is_some() {
            self.execute_throttled(request).await
        } else {
            self.execute_deduplicated(request).await
        }
    }

    /// Side-effecting call: per-host FIFO pacing, no deduplication. Each 429
    /// retry re-enters the queue, so a rate-limited job cannot starve the
    /// host's other waiters.
    async fn execute_throttled(&self, request: FetchRequest) -> ClientResult<FetchResponse> {
        let throttle = self.throttles.for_host(&host_bucket(&request.url));
        let mut attempt: u32 = 0;
        loop {
            throttle.admit().await;
            self.stats.record_throttle_admission();
            self.stats.record_physical_call();
            let response = self.transport.fetch(&request).await?;

            if response.status != STATUS_TOO_MANY_REQUESTS {
                return Ok(response);
            }
            attempt += 1;
            if self.retries_exhausted(attempt) {
                return Err(rate_limit_error(&request.url, &response));
            }
            let delay = response.retry_after().unwrap_or(self.retry_delay);
            log::warn!(
                "rate limited on {} (attempt {}), retrying in {:?}",
                request.url,
                attempt,
                delay
            );
            self.stats.record_rate_limit_retry();
            tokio::time::sleep(delay).await;
        }
    }

    /// Idempotent read: join or start the single flight for this URL and
    /// scope. Cancellation detaches only this caller; the shared call runs
    /// to completion for anyone else (and for record pruning).
    async fn execute_deduplicated(&self, request: FetchRequest) -> ClientResult<FetchResponse> {
        let url = request.url.clone();
        let scope = request.scope.clone();
        let scope_id = scope.as_ref().map(CancelScope::id);

        let (flight, joined) = self.flights.join(&url, scope_id, || {
            let transport = Arc::clone(&self.transport);
            let stats = Arc::clone(&self.stats);
            let retry_delay = self.retry_delay;
            let max_retry_attempts = self.max_retry_attempts;
            fetch_with_retry(transport, request, stats, retry_delay, max_retry_attempts)
        });
        if joined {
            log::debug!("joined in-flight request for {}", url);
            self.stats.record_dedup_join();
        }

        match scope {
            Some(scope) => {
                tokio::select! {
                    outcome = flight => outcome,
                    _ = scope.cancelled() => Err(ClientError::Cancelled { url }),
                }
            }
            None => flight.await,
        }
    }

    fn retries_exhausted(&self, attempt: u32) -> bool {
        matches!(self.max_retry_attempts, Some(max) if attempt > max)
    }
}

/// Retry loop shared by every waiter of one flight. Expressed as a loop so
/// sustained 429 streaks cannot grow the call stack.
async fn fetch_with_retry(
    transport: Arc<dyn Transport>,
    request: FetchRequest,
    stats: Arc<RequestStats>,
    retry_delay: Duration,
    max_retry_attempts: Option<u32>,
) -> ClientResult<FetchResponse> {
    let mut attempt: u32 = 0;
    loop {
        stats.record_physical_call();
        let response = transport.fetch(&request).await?;

        if response.status != STATUS_TOO_MANY_REQUESTS {
            return Ok(response);
        }
        attempt += 1;
        if matches!(max_retry_attempts, Some(max) if attempt > max) {
            return Err(rate_limit_error(&request.url, &response));
        }
        let delay = response.retry_after().unwrap_or(retry_delay);
        log::warn!(
            "rate limited on {} (attempt {}), retrying in {:?}",
            request.url,
            attempt,
            delay
        );
        stats.record_rate_limit_retry();
        tokio::time::sleep(delay).await;
    }
}

fn rate_limit_error(url: &str, response: &FetchResponse) -> ClientError {
    ClientError::HttpStatus {
        url: url.to_string(),
        status: STATUS_TOO_MANY_REQUESTS,
        body: response.text(),
    }
}

/// Throttle bucket for a URL: its host, or the whole string when it does not
/// parse as a URL with a host.
fn host_bucket(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
