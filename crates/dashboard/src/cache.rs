//! Listing page cache.
//!
//! Listing reads are served from a `moka` cache keyed by request path, search
//! query and page number. Mutations mark a path stale with
//! [`ListingCache::invalidate_path`], which drops every variant cached for
//! that path so the next read goes back to the store.
//!
//! Each path carries a generation number that is part of the cache key.
//! Invalidation bumps it, so a load that started before a mutation can only
//! land under the old generation, where no later read looks.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::models::InvoicePage;

/// Maximum number of cached listing variants.
const MAX_ENTRIES: u64 = 1000;

/// Identifies one cached listing variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub path: String,
    pub query: String,
    pub page: u32,
}

impl ListingKey {
    #[must_use]
    pub fn new(path: &str, query: &str, page: u32) -> Self {
        Self {
            path: path.to_string(),
            query: query.trim().to_string(),
            page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StampedKey {
    key: ListingKey,
    generation: u64,
}

/// Path-scoped cache of invoice listing pages.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct ListingCache {
    inner: Cache<StampedKey, Arc<InvoicePage>>,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl ListingCache {
    /// Create a cache whose entries expire `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self {
            inner,
            generations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn generations(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        // The map holds plain counters, so a poisoned lock is still consistent.
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn generation(&self, path: &str) -> u64 {
        self.generations().get(path).copied().unwrap_or_default()
    }

    /// Return the cached page for `key`, loading and caching it on a miss.
    ///
    /// Load errors are returned as-is and nothing is cached. A load that
    /// overlaps an invalidation of the same path is returned to its caller
    /// but never served to later reads.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` returns.
    pub async fn get_or_load<F, Fut, E>(&self, key: ListingKey, load: F) -> Result<Arc<InvoicePage>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<InvoicePage, E>>,
    {
        let generation = self.generation(&key.path);
        let stamped = StampedKey { key, generation };

        if let Some(page) = self.inner.get(&stamped).await {
            let key = &stamped.key;
            debug!(path = %key.path, query = %key.query, page = key.page, "Cache hit for listing");
            return Ok(page);
        }

        let page = Arc::new(load().await?);
        let current = self.generation(&stamped.key.path);
        if current == generation {
            self.inner.insert(stamped, Arc::clone(&page)).await;
        } else {
            debug!(path = %stamped.key.path, "Listing changed during load, not caching");
        }
        Ok(page)
    }

    /// Mark every cached variant of `path` stale.
    pub async fn invalidate_path(&self, path: &str) {
        {
            let mut generations = self.generations();
            let generation = generations.entry(path.to_string()).or_default();
            *generation = generation.wrapping_add(1);
        }

        let stale: Vec<Arc<StampedKey>> = self
            .inner
            .iter()
            .filter(|(stamped, _)| stamped.key.path == path)
            .map(|(stamped, _)| stamped)
            .collect();

        for stamped in &stale {
            self.inner.invalidate(stamped.as_ref()).await;
        }
        self.inner.run_pending_tasks().await;

        debug!(path, entries = stale.len(), "Invalidated listing cache");
    }

    /// Number of live entries (after pending maintenance).
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}
