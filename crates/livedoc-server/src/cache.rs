//! Page cache with path-based revalidation.
//!
//! Views are cached under the page path they back (`/` for a user's document
//! listing, `/document/{id}` for a room) plus an optional per-user key.
//! Mutations call [`PageCache::invalidate_path`], which drops every entry
//! cached under that path regardless of user.
//!
//! ## Example
//!
//! ```rust,ignore
//! let cache: PageCache<Room> = PageCache::new(Duration::from_secs(60));
//!
//! if let Some(room) = cache.get("/document/abc", None) {
//!     // fresh copy
//! }
//!
//! let generation = cache.generation("/document/abc");
//! let room = fetch().await?;
//! cache.set_if_current("/document/abc", None, generation, room);
//!
//! cache.invalidate_path("/document/abc");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use livedoc_core::RoomId;

/// Path of the document listing page.
pub const ROOT_PATH: &str = "/";

/// Path of a document's page.
pub fn document_path(room_id: &RoomId) -> String {
    format!("/document/{}", room_id)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: String,
    user: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedPage<V> {
    value: V,
    cached_at: Instant,
}

#[derive(Debug)]
struct CacheState<V> {
    pages: HashMap<CacheKey, CachedPage<V>>,
    /// Bumped by every invalidation of a path.
    generations: HashMap<String, u64>,
}

/// Thread-safe cache of page data keyed by path and user.
///
/// A value fetched while its path was invalidated must not be cached: callers
/// read [`PageCache::generation`] before fetching and store the result with
/// [`PageCache::set_if_current`].
#[derive(Debug, Clone)]
pub struct PageCache<V> {
    state: Arc<RwLock<CacheState<V>>>,
    max_age: Duration,
}

impl<V: Clone> PageCache<V> {
    /// Create a cache whose entries stay fresh for `max_age`.
    ///
    /// A zero `max_age` disables caching.
    pub fn new(max_age: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState {
                pages: HashMap::new(),
                generations: HashMap::new(),
            })),
            max_age,
        }
    }

    fn key(path: &str, user: Option<&str>) -> CacheKey {
        CacheKey {
            path: path.to_string(),
            user: user.map(str::to_string),
        }
    }

    /// Fresh value cached for `path` / `user`, if any.
    pub fn get(&self, path: &str, user: Option<&str>) -> Option<V> {
        let state = self.state.read().ok()?;
        let entry = state.pages.get(&Self::key(path, user))?;

        if entry.cached_at.elapsed() >= self.max_age {
            return None;
        }

        Some(entry.value.clone())
    }

    /// Current invalidation generation of `path`.
    pub fn generation(&self, path: &str) -> u64 {
        self.state
            .read()
            .map(|state| state.generations.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Cache `value` for `path` / `user` unconditionally.
    pub fn set(&self, path: &str, user: Option<&str>, value: V) {
        if self.max_age.is_zero() {
            return;
        }
        if let Ok(mut state) = self.state.write() {
            Self::insert(&mut state, path, user, value);
        }
    }

    /// Cache `value` only if `path` has not been invalidated since
    /// `generation` was read.
    ///
    /// Returns whether the value was stored.
    pub fn set_if_current(
        &self,
        path: &str,
        user: Option<&str>,
        generation: u64,
        value: V,
    ) -> bool {
        if self.max_age.is_zero() {
            return false;
        }
        let Ok(mut state) = self.state.write() else {
            return false;
        };

        let current = state.generations.get(path).copied().unwrap_or(0);
        if current != generation {
            tracing::debug!(path = %path, "Skipped caching a page invalidated during fetch");
            return false;
        }

        Self::insert(&mut state, path, user, value);
        true
    }

    fn insert(state: &mut CacheState<V>, path: &str, user: Option<&str>, value: V) {
        state.pages.insert(
            Self::key(path, user),
            CachedPage {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop every entry cached under `path` and bump its generation.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_path(&self, path: &str) -> usize {
        let Ok(mut state) = self.state.write() else {
            return 0;
        };

        *state.generations.entry(path.to_string()).or_insert(0) += 1;

        let before = state.pages.len();
        state.pages.retain(|key, _| key.path != path);
        let removed = before - state.pages.len();
        if removed > 0 {
            tracing::debug!(path = %path, removed, "Invalidated cached pages");
        }
        removed
    }

    /// Removes all expired entries. Returns the number removed.
    pub fn evict_expired(&self) -> usize {
        if let Ok(mut state) = self.state.write() {
            let before = state.pages.len();
            state
                .pages
                .retain(|_, entry| entry.cached_at.elapsed() < self.max_age);
            before - state.pages.len()
        } else {
            0
        }
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.pages.len()).unwrap_or(0)
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_path() {
        let id: RoomId = "abc".parse().unwrap();
        assert_eq!(document_path(&id), "/document/abc");
    }

    #[test]
    fn test_get_set() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.set(ROOT_PATH, Some("a@example.com"), 1u32);

        assert_eq!(cache.get(ROOT_PATH, Some("a@example.com")), Some(1));
        assert_eq!(cache.get(ROOT_PATH, Some("b@example.com")), None);
        assert_eq!(cache.get(ROOT_PATH, None), None);
    }

    #[test]
    fn test_invalidate_path_drops_all_users() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.set(ROOT_PATH, Some("a@example.com"), 1u32);
        cache.set(ROOT_PATH, Some("b@example.com"), 2u32);
        cache.set("/document/x", None, 3u32);

        assert_eq!(cache.invalidate_path(ROOT_PATH), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("/document/x", None), Some(3));
    }

    #[test]
    fn test_set_if_current_rejects_value_fetched_before_invalidation() {
        let cache = PageCache::new(Duration::from_secs(60));
        let path = "/document/x";

        let generation = cache.generation(path);
        cache.invalidate_path(path);

        assert!(!cache.set_if_current(path, None, generation, 1u32));
        assert_eq!(cache.get(path, None), None);

        let generation = cache.generation(path);
        assert!(cache.set_if_current(path, None, generation, 2u32));
        assert_eq!(cache.get(path, None), Some(2));
    }

    #[test]
    fn test_generation_is_per_path() {
        let cache = PageCache::<u32>::new(Duration::from_secs(60));
        let generation = cache.generation("/document/x");

        cache.invalidate_path(ROOT_PATH);
        assert_eq!(cache.generation("/document/x"), generation);
        assert_eq!(cache.generation(ROOT_PATH), 1);
    }

    #[test]
    fn test_zero_max_age_disables_cache() {
        let cache = PageCache::new(Duration::ZERO);
        cache.set(ROOT_PATH, None, 1u32);
        assert!(cache.is_empty());
        assert_eq!(cache.get(ROOT_PATH, None), None);
    }

    #[test]
    fn test_expired_entries_not_served() {
        let cache = PageCache::new(Duration::from_millis(10));
        cache.set(ROOT_PATH, None, 1u32);
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get(ROOT_PATH, None), None);
        assert_eq!(cache.evict_expired(), 1);
        assert!(cache.is_empty());
    }
}
