use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};
use tracing_futures::Instrument;

use crate::cache::{Cache, CacheReadStatus, Entry, Key};

/// The value of a fetch that was subject to caching, with how the cache behaved.
#[derive(Debug, PartialEq, Eq)]
pub struct CachedFetch<T> {
    pub value: T,
    pub status: CacheReadStatus,
}

/// Reads `key` from the cache and only runs `fetch` on a miss. The fetched value is stored
/// when `should_store` accepts it.
///
/// Without a cache (or key) the fetch always runs and nothing is stored. Cache backend failures
/// never fail the fetch: a failed read is a miss and a failed write is logged and dropped.
pub async fn cached_fetch<T, E, F>(
    cache: Option<(&Cache, Key)>,
    fetch: F,
    should_store: impl FnOnce(&T) -> bool,
) -> Result<CachedFetch<T>, E>
where
    T: Serialize + DeserializeOwned,
    F: Future<Output = Result<T, E>>,
{
    let Some((cache, key)) = cache else {
        tracing::info!("Cache BYPASS");

        return Ok(CachedFetch {
            value: fetch.await?,
            status: CacheReadStatus::Bypass,
        });
    };

    let entry = cache
        .get_json::<T>(&key)
        .instrument(tracing::info_span!("cache_get"))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Error loading {} from cache: {}", key, e);
            Entry::Miss
        });

    if let Entry::Hit(value) = entry {
        tracing::info!("Cache HIT - {}", key);

        return Ok(CachedFetch {
            value,
            status: CacheReadStatus::Hit,
        });
    }

    tracing::info!("Cache MISS - {}", key);

    let value = fetch.await?;

    if should_store(&value) {
        store(cache, &key, &value).await;
    }

    Ok(CachedFetch {
        value,
        status: CacheReadStatus::Miss,
    })
}

async fn store<T: Serialize>(cache: &Cache, key: &Key, value: &T) {
    if let Err(err) = cache
        .put_json(key, value)
        .instrument(tracing::info_span!("cache_put"))
        .await
    {
        tracing::warn!("Error cache PUT {}: {}", key, err);
    }
}
