//! Process-wide (but explicitly owned, see [`crate::engine::Engine`])
//! response cache keyed by a URL's canonical string form (spec.md section
//! 4.2 and invariant (iv) in section 3).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

/// A single memoized response body plus the bookkeeping needed to evict it.
struct CacheEntry {
    body: String,
    inserted: Instant,
    max_age: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.inserted).as_secs() < self.max_age
    }
}

/// Keyed by `Url`'s canonical string form. All access is serialized through
/// a `Mutex` rather than requiring external synchronization, matching
/// spec.md section 5's note that the cache is process-wide mutable state —
/// single-threaded in practice, but cheap to make safe regardless.
pub struct Cache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Cache {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Returns the cached body if present and not yet expired, evicting it
    /// if it has expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, body: String, max_age: u64) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key, CacheEntry { body, inserted: Instant::now(), max_age });
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn fresh_entry_is_returned_until_max_age_elapses() {
        let cache = Cache::new();
        cache.insert("http://x/".into(), "body".into(), 1);
        assert_eq!(cache.get("http://x/"), Some("body".into()));
        sleep(Duration::from_millis(1100));
        assert_eq!(cache.get("http://x/"), None);
    }

    #[test]
    fn missing_key_returns_none() {
        let cache = Cache::new();
        assert_eq!(cache.get("http://nope/"), None);
    }
}
