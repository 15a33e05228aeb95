//! Single-flight deduplication of idempotent reads.
//!
//! In-flight calls are tracked in a nested map: URL -> scope identity ->
//! shared pending result. A second caller with the same URL and scope joins
//! the existing flight instead of issuing another physical call; callers
//! with different scopes never share. The work itself runs on a spawned
//! task, so it settles (and its record is pruned) even if every waiter
//! drops or cancels.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::errors::{ClientError, ClientResult};
use crate::transport::FetchResponse;

/// Shared handle to one in-flight call. Awaiting a clone yields a `Clone` of
/// the settled result.
pub type FlightHandle = Shared<BoxFuture<'static, ClientResult<FetchResponse>>>;

type FlightTable = HashMap<String, HashMap<Option<u64>, FlightHandle>>;

#[derive(Default)]
pub struct SingleFlight {
    flights: Arc<Mutex<FlightTable>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight call for `(url, scope_id)` or start a new one from
    /// `start`. The second tuple field is true when an existing flight was
    /// joined.
    pub fn join<F>(
        &self,
        url: &str,
        scope_id: Option<u64>,
        start: impl FnOnce() -> F,
    ) -> (FlightHandle, bool)
    where
        F: Future<Output = ClientResult<FetchResponse>> + Send + 'static,
    {
        let mut flights = self.flights.lock();
        if let Some(existing) = flights.get(url).and_then(|per_url| per_url.get(&scope_id)) {
            return (existing.clone(), true);
        }

        let work = start();
        let table = Arc::clone(&self.flights);
        let url_owned = url.to_string();
        let task = tokio::spawn(async move {
            let outcome = work.await;
            // prune the settled record; drop the URL entry with its last scope
            let mut flights = table.lock();
            if let Some(per_url) = flights.get_mut(&url_owned) {
                per_url.remove(&scope_id);
                if per_url.is_empty() {
                    flights.remove(&url_owned);
                }
            }
            outcome
        });

        let failed_url = url.to_string();
        let handle: FlightHandle = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(ClientError::Network {
                    url: failed_url,
                    message: format!("in-flight task failed: {}", join_error),
                }),
            }
        }
        .boxed()
        .shared();

        flights
            .entry(url.to_string())
            .or_default()
            .insert(scope_id, handle.clone());
        (handle, false)
    }

    /// Number of URLs with at least one pending flight.
    pub fn in_flight_urls(&self) -> usize {
        self.flights.lock().len()
    }
}
