mod cached;

use std::{sync::Arc, time::Duration};

use serde::{de::DeserializeOwned, Serialize};

pub use cached::{cached_fetch, CachedFetch};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    CacheGet(String),
    #[error("{0}")]
    CachePut(String),
    #[error("{0}")]
    CacheDelete(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Wraps an entry from cache when getting it from there
#[derive(Debug, PartialEq, Eq)]
pub enum Entry<T> {
    Hit(T),
    Miss,
}

impl<T> Entry<T> {
    fn try_map<V, F: FnOnce(T) -> Result<V>>(self, f: F) -> Result<Entry<V>> {
        match self {
            Entry::Hit(value) => f(value).map(Entry::Hit),
            Entry::Miss => Ok(Entry::Miss),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Entry::Hit(value) => Some(value),
            Entry::Miss => None,
        }
    }
}

/// Represents the status of the cache read operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CacheReadStatus {
    Hit,
    Miss,
    Bypass,
}

/// Global cache config
#[derive(Clone, Debug)]
pub struct GlobalCacheConfig {
    pub key_prefix: String,
    pub ttl: Option<Duration>,
}

impl Default for GlobalCacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: String::from("eager"),
            ttl: None,
        }
    }
}

#[derive(Clone)]
pub struct Cache {
    config: Arc<GlobalCacheConfig>,
    inner: Arc<dyn CacheInner>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, derive_more::Display)]
pub struct Key(String);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Cache {
    pub fn new(inner: impl CacheInner + 'static, config: GlobalCacheConfig) -> Self {
        Self {
            config: Arc::new(config),
            inner: Arc::new(inner),
        }
    }

    pub fn build_key(&self, digest: &str) -> Key {
        Key(format!("{}:{}", self.config.key_prefix, digest))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &Key) -> Result<Entry<T>> {
        self.get(key)
            .await?
            .try_map(|bytes| serde_json::from_slice(&bytes).map_err(|err| Error::Serialization(err.to_string())))
    }

    pub async fn put_json<T: Serialize>(&self, key: &Key, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value).map_err(|err| Error::Serialization(err.to_string()))?;
        self.put(key, bytes, self.config.ttl).await
    }
}

impl std::ops::Deref for Cache {
    type Target = dyn CacheInner;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

/// A cache backend. Expiry is the backend's business, the engine never invalidates entries itself.
#[async_trait::async_trait]
pub trait CacheInner: Send + Sync {
    async fn get(&self, key: &Key) -> Result<Entry<Vec<u8>>>;
    async fn put(&self, key: &Key, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;
    async fn delete(&self, key: &Key) -> Result<()>;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;

    #[async_trait::async_trait]
    pub trait FakeCache: Send + Sync {
        async fn get(&self, _key: &Key) -> Result<Entry<Vec<u8>>> {
            unimplemented!()
        }

        async fn put(&self, _key: &Key, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
            unimplemented!()
        }

        async fn delete(&self, _key: &Key) -> Result<()> {
            unimplemented!()
        }
    }

    #[async_trait::async_trait]
    impl<T: FakeCache> CacheInner for T {
        async fn get(&self, key: &Key) -> Result<Entry<Vec<u8>>> {
            FakeCache::get(self, key).await
        }

        async fn put(&self, key: &Key, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
            FakeCache::put(self, key, value, ttl).await
        }

        async fn delete(&self, key: &Key) -> Result<()> {
            FakeCache::delete(self, key).await
        }
    }
}
