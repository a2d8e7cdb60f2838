//! Single-entry TTL store for the rendered global feed.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::warn;

/// A rendered response, replayed byte-for-byte while fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

struct Entry {
    stored_at: Instant,
    response: CachedResponse,
}

/// The global feed cache: one entry, expired purely by time.
pub struct FeedCache {
    entry: RwLock<Option<Entry>>,
    ttl: Duration,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    /// Returns the cached response if one was stored within the TTL window.
    pub fn get(&self) -> Option<CachedResponse> {
        self.get_at(Instant::now())
    }

    pub fn put(&self, response: CachedResponse) {
        self.put_at(response, Instant::now());
    }

    /// Drop the entry immediately instead of waiting out the TTL.
    pub fn clear(&self) {
        *self.write_entry() = None;
    }

    fn get_at(&self, now: Instant) -> Option<CachedResponse> {
        let guard = self.read_entry();
        match guard.as_ref() {
            Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                Some(entry.response.clone())
            }
            // Expired entries are left in place; the next put overwrites them.
            _ => None,
        }
    }

    fn put_at(&self, response: CachedResponse, now: Instant) {
        *self.write_entry() = Some(Entry {
            stored_at: now,
            response,
        });
    }

    // A panic while the lock is held only ever leaves a stale or missing
    // entry behind, and the TTL already bounds staleness, so a poisoned
    // lock is logged and reused rather than propagated.
    fn read_entry(&self) -> RwLockReadGuard<'_, Option<Entry>> {
        self.entry.read().unwrap_or_else(|poisoned| {
            warn!(store = "feed_cache", "reading through a poisoned lock");
            poisoned.into_inner()
        })
    }

    fn write_entry(&self) -> RwLockWriteGuard<'_, Option<Entry>> {
        self.entry.write().unwrap_or_else(|poisoned| {
            warn!(store = "feed_cache", "replacing entry behind a poisoned lock");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn serves_stored_bytes_within_ttl() {
        let cache = FeedCache::new(Duration::from_secs(20));
        let start = Instant::now();
        cache.put_at(response("feed page"), start);

        let hit = cache
            .get_at(start + Duration::from_secs(19))
            .expect("entry should still be fresh");
        assert_eq!(hit.body, Bytes::from_static(b"feed page"));
    }

    #[test]
    fn expires_exactly_at_ttl() {
        let cache = FeedCache::new(Duration::from_secs(20));
        let start = Instant::now();
        cache.put_at(response("feed page"), start);

        assert!(cache.get_at(start + Duration::from_secs(20)).is_none());
    }

    #[test]
    fn stale_content_survives_until_expiry() {
        // The store has no write invalidation: a put is only superseded by
        // another put or by the clock.
        let cache = FeedCache::new(Duration::from_secs(20));
        let start = Instant::now();
        cache.put_at(response("deleted post still visible"), start);

        let hit = cache.get_at(start + Duration::from_secs(5)).unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"deleted post still visible"));
    }

    #[test]
    fn clear_drops_the_entry() {
        let cache = FeedCache::new(Duration::from_secs(20));
        cache.put(response("feed page"));
        cache.clear();
        assert!(cache.get().is_none());
    }

    #[test]
    fn empty_cache_misses() {
        let cache = FeedCache::new(Duration::from_secs(20));
        assert!(cache.get().is_none());
    }

    #[test]
    fn survives_a_panicked_writer() {
        use std::sync::Arc;

        let cache = Arc::new(FeedCache::new(Duration::from_secs(20)));
        let poisoner = Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entry.write().unwrap();
            panic!("writer died mid-update");
        })
        .join();

        cache.put(response("after recovery"));
        let hit = cache.get().expect("poisoned lock should be recovered");
        assert_eq!(hit.body, Bytes::from_static(b"after recovery"));
    }
}
