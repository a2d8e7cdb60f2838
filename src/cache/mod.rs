//! Time-based response cache for the global feed.
//!
//! A single shared entry holds the most recently rendered global feed
//! response. The key deliberately ignores page number and actor identity;
//! staleness is bounded only by the TTL, never by write invalidation.

mod config;
mod middleware;
mod store;

pub use config::CacheConfig;
pub use middleware::{CacheState, feed_cache_layer};
pub use store::{CachedResponse, FeedCache};
