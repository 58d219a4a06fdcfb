use std::{
    collections::{BinaryHeap, HashMap},
    time::{Duration, Instant},
};

use futures_util::lock::Mutex;
use runtime::cache::{CacheInner, Entry, Key, Result};

/// A process local cache backend. Entries stored with a ttl are dropped once it elapses,
/// entries without one live as long as the cache.
pub struct InMemoryCache {
    inner: Mutex<Entries>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn new_with_time(now: impl Fn() -> Instant + Sync + Send + 'static) -> Self {
        InMemoryCache {
            inner: Mutex::new(Entries {
                now: Box::new(now),
                key_to_entry: HashMap::new(),
                deletion_tasks: BinaryHeap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let now = (inner.now)();
        inner.purge(now);
        inner.key_to_entry.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        InMemoryCache {
            inner: Mutex::new(Entries {
                now: Box::new(Instant::now),
                key_to_entry: HashMap::new(),
                deletion_tasks: BinaryHeap::new(),
            }),
        }
    }
}

struct Entries {
    // for testing
    now: Box<dyn Fn() -> Instant + Sync + Send>,
    key_to_entry: HashMap<String, CacheEntry>,
    deletion_tasks: BinaryHeap<DeletionTask>,
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

#[derive(Debug, PartialEq, Eq)]
struct DeletionTask {
    key: String,
    to_delete_at: Instant,
}

impl PartialOrd for DeletionTask {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeletionTask {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_delete_at.cmp(&other.to_delete_at).reverse()
    }
}

impl Entries {
    fn purge(&mut self, now: Instant) {
        while self
            .deletion_tasks
            .peek()
            .is_some_and(|task| task.to_delete_at <= now)
        {
            let Some(DeletionTask { key, .. }) = self.deletion_tasks.pop() else {
                break;
            };

            // the key may have been overwritten since, with a later or no expiry
            let expired = self
                .key_to_entry
                .get(&key)
                .and_then(|entry| entry.expires_at)
                .is_some_and(|expires_at| expires_at <= now);

            if expired {
                self.key_to_entry.remove(&key);
            }
        }
    }
}

#[async_trait::async_trait]
impl CacheInner for InMemoryCache {
    async fn get(&self, key: &Key) -> Result<Entry<Vec<u8>>> {
        let mut inner = self.inner.lock().await;
        let now = (inner.now)();
        inner.purge(now);

        Ok(inner
            .key_to_entry
            .get(key.as_str())
            .map(|entry| Entry::Hit(entry.value.clone()))
            .unwrap_or(Entry::Miss))
    }

    async fn put(&self, key: &Key, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let now = (inner.now)();
        inner.purge(now);

        // a ttl too large to represent never expires
        let expires_at = ttl.and_then(|ttl| now.checked_add(ttl));

        if let Some(to_delete_at) = expires_at {
            inner.deletion_tasks.push(DeletionTask {
                key: key.to_string(),
                to_delete_at,
            });
        }

        inner
            .key_to_entry
            .insert(key.to_string(), CacheEntry { value, expires_at });

        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let now = (inner.now)();
        inner.purge(now);
        inner.key_to_entry.remove(key.as_str());
        Ok(())
    }
}
