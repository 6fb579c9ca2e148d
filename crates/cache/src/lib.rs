//! Tag-aware read-through cache.
//!
//! Entries are filed under one or more tags. Invalidating a tag drops every
//! entry filed under it in one step; there is no per-key invalidation. Each
//! tag also carries a version that is bumped on invalidation. Entries remember
//! the versions they were computed against, so a value computed while one of
//! its tags was invalidated is never served.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

pub mod memory;

pub use memory::MemoryCache;

/// Error type for cache backends.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Versions of a set of tags captured at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagVersions {
    entries: Vec<(String, u64)>,
}

impl TagVersions {
    pub fn new(entries: Vec<(String, u64)>) -> Self {
        Self { entries }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(tag, _)| tag.as_str())
    }

    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }
}

/// Computation run on a miss; `None` means it failed and nothing is stored.
pub type Compute<'a> = Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

/// Outcome of [`TagAwareCache::get_or_compute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A value whose tags were not invalidated since it was computed.
    Fresh(String),
    /// A value computed while one of its tags was invalidated. It was not kept.
    Stale(String),
    /// No value: the computation failed or never ran for this caller.
    Missing,
}

/// Key/value store supporting bulk invalidation by tag.
#[async_trait]
pub trait TagAwareCache: Send + Sync {
    /// Look up a fresh entry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Return the entry for `key`, running `compute` on a miss and filing the
    /// result under `tags`.
    ///
    /// Concurrent misses on one key share a single computation.
    async fn get_or_compute(
        &self,
        key: &str,
        tags: &[&str],
        compute: Compute<'_>,
    ) -> Result<Lookup, CacheError>;

    /// Drop every entry filed under any of `tags`, returning how many went.
    async fn invalidate_tags(&self, tags: &[&str]) -> Result<usize, CacheError>;
}

/// Handle shared across request handlers.
pub type SharedCache = Arc<dyn TagAwareCache>;

impl dyn TagAwareCache {
    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// Errors from `compute` are returned as-is and nothing is cached. When
    /// another caller's computation failed or went stale, `compute` runs again
    /// for this caller without touching the cache.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        tags: &[&str],
        compute: F,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<String, E>> + Send,
        E: From<CacheError> + Send,
    {
        let mut pending = Some(compute);
        let mut failure: Option<E> = None;

        let lookup = {
            let pending = &mut pending;
            let failure = &mut failure;
            self.get_or_compute(
                key,
                tags,
                Box::pin(async move {
                    let compute = pending.take()?;
                    match compute().await {
                        Ok(value) => Some(value),
                        Err(err) => {
                            *failure = Some(err);
                            None
                        }
                    }
                }),
            )
            .await?
        };

        match lookup {
            Lookup::Fresh(value) => Ok(value),
            // Our own computation raced an invalidation: hand it back, unstored.
            Lookup::Stale(value) if pending.is_none() => Ok(value),
            Lookup::Stale(_) | Lookup::Missing => {
                if let Some(err) = failure {
                    return Err(err);
                }
                match pending {
                    Some(compute) => {
                        tracing::debug!(target: "bookshelf-cache", key, "shared computation unusable, computing directly");
                        compute().await
                    }
                    None => Err(CacheError::Backend(format!("no value computed for '{key}'")).into()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Upper bound on stored entries; the least valuable go first past it.
    #[serde(default = "CacheSettings::default_max_capacity")]
    pub max_capacity: u64,
    /// Entry lifetime in seconds; entries live until evicted or invalidated when unset.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl CacheSettings {
    fn default_max_capacity() -> u64 {
        10_000
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: Self::default_max_capacity(),
            ttl_secs: None,
        }
    }
}

/// Build the cache backend described by `settings`.
pub fn build(settings: &CacheSettings) -> SharedCache {
    let ttl = settings.ttl_secs.map(Duration::from_secs);
    tracing::info!(
        target: "bookshelf-cache",
        max_capacity = settings.max_capacity,
        ttl_secs = ?settings.ttl_secs,
        "in-memory tag cache ready"
    );
    Arc::new(MemoryCache::new(settings.max_capacity, ttl))
}
