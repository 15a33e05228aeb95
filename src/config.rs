//! Client configuration.

use serde::{Deserialize, Serialize};

// ============================================================================
// DEFAULTS
// ============================================================================

/// Minimum interval between physical calls admitted to one host, in
/// milliseconds. Matches the server's documented fair-use pacing.
pub const DEFAULT_THROTTLE_INTERVAL_MS: u64 = 1500;

/// Wait before retrying a rate-limited call when the server sends no usable
/// `retry-after` header, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1500;

/// Capacity of the metadata cache (entries).
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// TTL applied to repository metadata fetches, in seconds. Short on purpose:
/// metadata carries the ref pointers that move on every publish.
pub const DEFAULT_METADATA_TTL_SECS: u64 = 5;

/// Transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root endpoint of the repository API, e.g. `https://demo.example.io/api/v2`.
    pub base_url: String,
    #[serde(default = "default_throttle_interval_ms")]
    pub throttle_interval_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Ceiling on transparent 429 retries. `None` retries until the server
    /// stops rate limiting.
    #[serde(default)]
    pub max_retry_attempts: Option<u32>,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_metadata_ttl_secs")]
    pub metadata_ttl_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            throttle_interval_ms: DEFAULT_THROTTLE_INTERVAL_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_retry_attempts: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            metadata_ttl_secs: DEFAULT_METADATA_TTL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_throttle_interval_ms() -> u64 {
    DEFAULT_THROTTLE_INTERVAL_MS
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_metadata_ttl_secs() -> u64 {
    DEFAULT_METADATA_TTL_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
