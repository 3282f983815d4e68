/// Time-bounded in-memory cache for metadata API responses
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::api::VideoData;

struct CacheEntry {
    videos: HashMap<String, VideoData>,
    expires_at: Instant,
}

/// Caches fetched metadata keyed by the full requested identifier set.
///
/// Entries expire after the configured TTL; an expired entry is a miss and
/// is evicted lazily on the lookup that finds it.
pub struct ResponseCache {
    ttl: Duration,
    entries: HashMap<u64, CacheEntry>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Cache key for a set of video IDs. Request order does not matter:
    /// the IDs are sorted before hashing.
    pub fn cache_key(video_ids: &[String]) -> u64 {
        let mut sorted: Vec<&String> = video_ids.iter().collect();
        sorted.sort();

        let mut hasher = DefaultHasher::new();
        for id in sorted {
            id.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Look up a cached response, evicting it first if expired.
    pub fn get(&mut self, key: u64) -> Option<HashMap<String, VideoData>> {
        match self.entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.videos.clone()),
            Some(_) => {
                debug!("cache entry {:016x} expired, evicting", key);
                self.entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: u64, videos: HashMap<String, VideoData>) {
        self.entries.insert(
            key,
            CacheEntry {
                videos,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_videos() -> HashMap<String, VideoData> {
        let mut videos = HashMap::new();
        videos.insert(
            "dQw4w9WgXcQ".to_string(),
            VideoData {
                title: "Sample".to_string(),
                ..VideoData::default()
            },
        );
        videos
    }

    #[test]
    fn test_cache_key_ignores_order() {
        let a = vec!["aaaaaaaaaaa".to_string(), "bbbbbbbbbbb".to_string()];
        let b = vec!["bbbbbbbbbbb".to_string(), "aaaaaaaaaaa".to_string()];
        assert_eq!(ResponseCache::cache_key(&a), ResponseCache::cache_key(&b));
    }

    #[test]
    fn test_cache_key_differs_for_different_sets() {
        let a = vec!["aaaaaaaaaaa".to_string()];
        let b = vec!["bbbbbbbbbbb".to_string()];
        assert_ne!(ResponseCache::cache_key(&a), ResponseCache::cache_key(&b));
    }

    #[test]
    fn test_hit_within_ttl() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        let key = ResponseCache::cache_key(&["dQw4w9WgXcQ".to_string()]);

        assert!(cache.get(key).is_none());
        cache.insert(key, sample_videos());

        let hit = cache.get(key).expect("entry should still be valid");
        assert_eq!(hit.len(), 1);
        assert!(hit.contains_key("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let mut cache = ResponseCache::new(Duration::from_millis(0));
        let key = ResponseCache::cache_key(&["dQw4w9WgXcQ".to_string()]);

        cache.insert(key, sample_videos());
        assert_eq!(cache.len(), 1);

        assert!(cache.get(key).is_none());
        assert!(cache.is_empty());
    }
}
