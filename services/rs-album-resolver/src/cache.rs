//!
//! src/cache.rs  Andrew Belles  Oct 18th, 2025
//!
//! In-memory ttl cache for resolved albums. Keys pass through the
//! normalizer so ids, urls and uris for one album share an entry.
//! Nothing here survives a restart.
//!

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::{task::JoinHandle, time::{Instant, MissedTickBehavior}};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::normalize::normalize;
use crate::types::ResolvedAlbum;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub timestamp: Instant
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,          // stored entries, expired ones included
    pub ttl: Duration,
    pub entries: Vec<String>, // keys still fresh, sorted
}

#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration
}

pub type AlbumCache = TtlCache<Arc<ResolvedAlbum>>;

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl }
    }

    pub fn from_config(cfg: &CacheConfig) -> Self {
        Self::new(cfg.ttl)
    }

    // a panic while holding the lock leaves the map itself intact
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.timestamp) >= self.ttl
    }

    /// Fresh value under the normalized key; an expired entry is evicted
    pub fn get(&self, raw_key: &str) -> Option<V> {
        let key = normalize(raw_key);
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get(&key) {
            None => {
                debug!(key = %key, "cache.miss");
                None
            }
            Some(entry) if self.is_expired(entry, now) => {
                entries.remove(&key);
                debug!(key = %key, "cache.expired");
                None
            }
            Some(entry) => {
                info!(key = %key, "cache.hit");
                Some(entry.data.clone())
            }
        }
    }

    pub fn set(&self, raw_key: &str, data: V) {
        let key = normalize(raw_key);
        let entry = CacheEntry { data, timestamp: Instant::now() };
        self.lock().insert(key.clone(), entry);
        info!(key = %key, "cache.set");
    }

    /// Returns whether an entry was removed
    pub fn delete(&self, raw_key: &str) -> bool {
        let key = normalize(raw_key);
        let removed = self.lock().remove(&key).is_some();
        info!(key = %key, removed, "cache.delete");
        removed
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let size = entries.len();
        entries.clear();
        info!(removed = size, "cache.clear");
        size
    }

    /// Evicts every expired entry, returns how many went
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - entries.len();

        if removed > 0 {
            info!(removed, "cache.cleanup");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.lock();
        let mut live: Vec<String> = entries.iter()
            .filter(|(_, entry)| !self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        live.sort();

        CacheStats { size: entries.len(), ttl: self.ttl, entries: live }
    }
}

/// Runs cleanup every `every` until `shutdown` is cancelled
pub fn spawn_sweeper<V>(
    cache: Arc<TtlCache<V>>,
    every: Duration,
    shutdown: CancellationToken
) -> JoinHandle<()>
where
    V: Clone + Send + 'static
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(every_ms = every.as_millis() as u64, "cache.sweeper.start");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    cache.cleanup();
                }
            }
        }
        info!("cache.sweeper.stop");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn fresh_until_ttl_then_miss() {
        let cache: TtlCache<u32> = TtlCache::new(TTL);
        cache.set("abc123", 7);

        advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get("abc123"), Some(7));

        advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("abc123"), None);

        // lazily evicted on that read
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn equivalent_references_hit_one_entry() {
        let cache: TtlCache<&str> = TtlCache::new(TTL);
        cache.set("https://open.spotify.com/album/ABC123", "abbey road");

        assert_eq!(cache.get("spotify:album:ABC123"), Some("abbey road"));
        assert_eq!(cache.get("abc123"), Some("abbey road"));
        assert_eq!(cache.stats().entries, vec!["abc123".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_do_not_bleed_into_each_other() {
        let cache: TtlCache<u32> = TtlCache::new(TTL);
        cache.set("k1", 1);
        assert_eq!(cache.get("k2"), None);

        cache.set("k2", 2);
        cache.set("k1", 10);
        assert_eq!(cache.get("k1"), Some(10));
        assert_eq!(cache.get("K2"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn set_refreshes_timestamp() {
        let cache: TtlCache<u32> = TtlCache::new(TTL);
        cache.set("k", 1);
        advance(TTL / 2).await;
        cache.set("k", 2);
        advance(TTL / 2 + Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_and_clear() {
        let cache: TtlCache<u32> = TtlCache::new(TTL);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert!(cache.delete("A"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.get("a"), None);

        assert_eq!(cache.clear(), 2);
        assert_eq!(cache.clear(), 0);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_removes_only_expired() {
        let cache: TtlCache<u32> = TtlCache::new(TTL);
        cache.set("old", 1);
        advance(TTL / 2).await;
        cache.set("new", 2);
        advance(TTL / 2).await;

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.entries, vec!["new".to_string()]);
        assert_eq!(stats.ttl, TTL);

        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.cleanup(), 0);
        assert_eq!(cache.get("new"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_in_background() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(10)));
        cache.set("k", 1_u32);

        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(cache.clone(), Duration::from_secs(1), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(cache.stats().size, 0);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
