//! Repository client with cache-aside metadata fetches.
//!
//! Metadata endpoints (the API root with its refs, types and languages) are
//! memoized in an [`ExpiringCache`] so repeated lookups inside a TTL window
//! cost nothing. Content queries are never cached here: freshness wins over
//! call reduction, and concurrent identical queries still collapse into one
//! physical call through the orchestrator.

pub mod types;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::ExpiringCache;
use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult};
use crate::requests::{RequestOrchestrator, StatsSnapshot};
use crate::transport::{FetchRequest, FetchResponse, HttpTransport, Transport};

pub use types::{Language, RepositoryInfo, RepositoryRef};

/// Per-call caching knobs for [`RepositoryClient::cached_request`].
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// TTL in seconds. When absent, the response's
    /// `cache-control: max-age` is used; when neither resolves (or either is
    /// zero) the result is returned without being cached.
    pub ttl: Option<u64>,
    /// Cache key override; defaults to the URL.
    pub cache_key: Option<String>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl = Some(ttl_secs);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }
}

pub struct RepositoryClient {
    config: ClientConfig,
    orchestrator: RequestOrchestrator,
    metadata_cache: Mutex<ExpiringCache<FetchResponse>>,
}

impl RepositoryClient {
    /// Client over the production HTTP transport.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = Arc::new(HttpTransport::new(config.timeout_secs)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Client over an injected transport. This is the seam tests use.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let orchestrator = RequestOrchestrator::new(transport, &config);
        let metadata_cache = Mutex::new(ExpiringCache::new(config.cache_capacity));
        Self {
            config,
            orchestrator,
            metadata_cache,
        }
    }

    /// Cache-aside fetch. A fresh cache entry answers without any network
    /// activity; a miss goes through the orchestrator (so concurrent misses
    /// for one key still cost one physical call) and is stored only when a
    /// TTL resolves. Non-2xx responses surface as errors and nothing is
    /// cached for them.
    pub async fn cached_request(
        &self,
        url: &str,
        options: CacheOptions,
    ) -> ClientResult<FetchResponse> {
        let key = options.cache_key.as_deref().unwrap_or(url);

        if let Some(hit) = self.metadata_cache.lock().get(key).cloned() {
            log::debug!("cache hit for {}", key);
            return Ok(hit);
        }

        log::debug!("cache miss for {}, fetching", key);
        let response = self.orchestrator.execute(FetchRequest::get(url)).await?;
        if !response.ok() {
            return Err(ClientError::HttpStatus {
                url: url.to_string(),
                status: response.status,
                body: response.text(),
            });
        }

        let ttl = options
            .ttl
            .filter(|secs| *secs > 0)
            .or_else(|| response.max_age().filter(|secs| *secs > 0));
        if let Some(ttl_secs) = ttl {
            self.metadata_cache
                .lock()
                .set(key.to_string(), response.clone(), Some(ttl_secs));
        }
        Ok(response)
    }

    /// Pass a request straight to the orchestrator: throttled when it has a
    /// body, deduplicated when it does not, never cached.
    pub async fn request(&self, request: FetchRequest) -> ClientResult<FetchResponse> {
        self.orchestrator.execute(request).await
    }

    /// Typed repository metadata from the configured base URL, memoized for
    /// `metadata_ttl_secs`.
    pub async fn repository(&self) -> ClientResult<RepositoryInfo> {
        let url = self.config.base_url.clone();
        let response = self
            .cached_request(
                &url,
                CacheOptions::new().with_ttl(self.config.metadata_ttl_secs),
            )
            .await?;
        response.json()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.orchestrator.stats()
    }

    /// Drop every memoized metadata response.
    pub fn clear_cache(&self) {
        self.metadata_cache.lock().clear();
    }
}
