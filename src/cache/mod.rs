//! In-memory caches backing the client.
//!
//! [`LruCache`] is the capacity-bounded store; [`ExpiringCache`] layers
//! per-entry TTLs on top of it. Both are plain synchronous data structures;
//! callers own the locking.

pub mod expiring;
pub mod lru;

pub use expiring::ExpiringCache;
pub use lru::LruCache;
