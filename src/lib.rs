//! Async client core for hosted document-repository HTTP APIs.
//!
//! The crate is layered bottom-up:
//!
//! - [`cache`] — capacity-bounded LRU store and its TTL wrapper
//! - [`requests`] — orchestration: per-host throttling, single-flight
//!   deduplication of idempotent reads, transparent 429 retry
//! - [`transport`] — the injected network seam and its reqwest implementation
//! - [`client`] — cache-aside repository client composing the above
//!
//! ```no_run
//! use docrepo::{ClientConfig, RepositoryClient};
//!
//! # async fn run() -> docrepo::ClientResult<()> {
//! let client = RepositoryClient::new(ClientConfig::new("https://demo.example.io/api/v2"))?;
//! let info = client.repository().await?;
//! println!("master ref: {:?}", info.master_ref());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod requests;
pub mod transport;

pub use cache::{ExpiringCache, LruCache};
pub use client::{CacheOptions, RepositoryClient, RepositoryInfo};
pub use config::ClientConfig;
pub use errors::{ClientError, ClientResult};
pub use requests::{CancelScope, RequestOrchestrator, StatsSnapshot};
pub use transport::{FetchRequest, FetchResponse, HttpTransport, Method, Transport};
