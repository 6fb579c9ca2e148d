//! In-process backend: a bounded moka cache plus a tag-to-keys index.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use moka::notification::RemovalCause;
use parking_lot::Mutex;

use crate::{CacheError, Compute, Lookup, TagAwareCache, TagVersions};

#[derive(Debug)]
struct Entry {
    value: String,
    versions: TagVersions,
}

/// Marker returned to moka when a computation yields nothing.
#[derive(Debug)]
struct ComputeFailed;

#[derive(Debug, Default)]
struct TagIndex {
    keys: HashMap<String, HashSet<String>>,
    versions: HashMap<String, u64>,
}

impl TagIndex {
    fn version(&self, tag: &str) -> u64 {
        self.versions.get(tag).copied().unwrap_or(0)
    }

    fn snapshot(&self, tags: &[&str]) -> TagVersions {
        TagVersions::new(
            tags.iter()
                .map(|tag| (tag.to_string(), self.version(tag)))
                .collect(),
        )
    }

    fn is_current(&self, versions: &TagVersions) -> bool {
        versions
            .entries()
            .iter()
            .all(|(tag, seen)| self.version(tag) == *seen)
    }

    fn file(&mut self, key: &str, versions: &TagVersions) {
        for tag in versions.tags() {
            self.keys
                .entry(tag.to_string())
                .or_default()
                .insert(key.to_string());
        }
    }

    fn forget(&mut self, key: &str) {
        self.keys.retain(|_, keys| {
            keys.remove(key);
            !keys.is_empty()
        });
    }

    /// Bump the version of every tag and take the keys filed under them.
    fn invalidate(&mut self, tags: &[&str]) -> HashSet<String> {
        let mut keys = HashSet::new();
        for tag in tags {
            *self.versions.entry(tag.to_string()).or_insert(0) += 1;
            keys.extend(self.keys.remove(*tag).unwrap_or_default());
        }
        for key in &keys {
            self.forget(key);
        }
        keys
    }
}

/// Tag-aware cache held in process memory.
///
/// At most `max_capacity` entries are kept. Entries evicted for size or age
/// leave the tag index through the eviction listener.
pub struct MemoryCache {
    entries: Cache<String, Arc<Entry>>,
    index: Arc<Mutex<TagIndex>>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64, ttl: Option<Duration>) -> Self {
        let index = Arc::new(Mutex::new(TagIndex::default()));
        let listener_index = Arc::clone(&index);

        let mut builder = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_listener(move |key: Arc<String>, _entry: Arc<Entry>, cause: RemovalCause| {
                if matches!(cause, RemovalCause::Expired | RemovalCause::Size) {
                    listener_index.lock().forget(&key);
                }
            });
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            entries: builder.build(),
            index,
        }
    }

    /// Approximate number of stored entries.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Apply pending evictions and expirations now.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Keys currently filed under `tag`.
    pub fn keys_for_tag(&self, tag: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .index
            .lock()
            .keys
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn is_current(&self, entry: &Entry) -> bool {
        self.index.lock().is_current(&entry.versions)
    }

    async fn discard(&self, key: &str) {
        self.index.lock().forget(key);
        self.entries.invalidate(key).await;
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TagAwareCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let Some(entry) = self.entries.get(key).await else {
            return Ok(None);
        };
        if self.is_current(&entry) {
            return Ok(Some(entry.value.clone()));
        }
        self.discard(key).await;
        Ok(None)
    }

    async fn get_or_compute(
        &self,
        key: &str,
        tags: &[&str],
        compute: Compute<'_>,
    ) -> Result<Lookup, CacheError> {
        if let Some(value) = self.get(key).await? {
            tracing::debug!(target: "bookshelf-cache", key, "cache hit");
            return Ok(Lookup::Fresh(value));
        }

        let versions = self.index.lock().snapshot(tags);
        let index = &self.index;
        let computed = self
            .entries
            .try_get_with(key.to_string(), async {
                let value = compute.await.ok_or(ComputeFailed)?;
                index.lock().file(key, &versions);
                Ok::<_, ComputeFailed>(Arc::new(Entry {
                    value,
                    versions: versions.clone(),
                }))
            })
            .await;

        let Ok(entry) = computed else {
            return Ok(Lookup::Missing);
        };
        if self.is_current(&entry) {
            tracing::debug!(target: "bookshelf-cache", key, "cache miss, stored");
            return Ok(Lookup::Fresh(entry.value.clone()));
        }

        self.discard(key).await;
        tracing::debug!(target: "bookshelf-cache", key, "tag invalidated during compute, not stored");
        Ok(Lookup::Stale(entry.value.clone()))
    }

    async fn invalidate_tags(&self, tags: &[&str]) -> Result<usize, CacheError> {
        // Versions move first, so entries still in moka stop being served at once.
        let keys = self.index.lock().invalidate(tags);

        let mut removed = 0;
        for key in keys {
            if self.entries.remove(&key).await.is_some() {
                removed += 1;
            }
        }

        tracing::debug!(target: "bookshelf-cache", ?tags, removed, "tags invalidated");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fill(cache: &MemoryCache, key: &str, value: &str, tags: &[&str]) {
        let value = value.to_string();
        let lookup = cache
            .get_or_compute(key, tags, Box::pin(async move { Some(value) }))
            .await
            .unwrap();
        assert!(matches!(lookup, Lookup::Fresh(_)));
    }

    #[tokio::test]
    async fn invalidate_removes_only_tagged_keys() {
        let cache = MemoryCache::new(100, None);
        fill(&cache, "books_list_all", "[]", &["books"]).await;
        fill(&cache, "books_list_page1_limit5", "[]", &["books"]).await;
        fill(&cache, "authors_list_all", "[]", &["authors"]).await;

        let removed = cache.invalidate_tags(&["books"]).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(cache.get("books_list_all").await.unwrap(), None);
        assert_eq!(cache.get("books_list_page1_limit5").await.unwrap(), None);
        assert_eq!(
            cache.get("authors_list_all").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(cache.keys_for_tag("books").is_empty());
        assert_eq!(cache.keys_for_tag("authors"), vec!["authors_list_all"]);
    }

    #[tokio::test]
    async fn entry_under_two_tags_goes_with_either() {
        let cache = MemoryCache::new(100, None);
        fill(&cache, "shared", "x", &["books", "authors"]).await;

        cache.invalidate_tags(&["authors"]).await.unwrap();

        assert_eq!(cache.get("shared").await.unwrap(), None);
        assert!(cache.keys_for_tag("books").is_empty());
    }

    #[tokio::test]
    async fn failed_compute_reports_missing() {
        let cache = MemoryCache::new(100, None);

        let lookup = cache
            .get_or_compute("book_404", &["books"], Box::pin(async { None }))
            .await
            .unwrap();

        assert_eq!(lookup, Lookup::Missing);
        assert!(cache.keys_for_tag("books").is_empty());
    }

    #[tokio::test]
    async fn distinct_keys_stay_within_capacity() {
        let cache = MemoryCache::new(100, None);

        for page in 1000..6000 {
            let key = format!("books_list_page{page}_limit5");
            cache
                .get_or_compute(&key, &["books"], Box::pin(async { Some("[]".to_string()) }))
                .await
                .unwrap();
        }
        cache.run_pending_tasks().await;

        assert!(cache.entry_count() <= 100, "{} entries", cache.entry_count());
        assert!(cache.keys_for_tag("books").len() <= 100);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new(100, Some(Duration::from_millis(50)));
        fill(&cache, "book_1", "{}", &["books"]).await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(cache.get("book_1").await.unwrap(), None);
        cache.run_pending_tasks().await;
        assert!(cache.keys_for_tag("books").is_empty());
    }
}
