//! Advisory, time-boxed memoization of store fetches.
//!
//! The dashboard re-runs its aggregations on every interaction; the fetch
//! is the only part worth memoizing. The cache is an explicit collaborator
//! wrapped around a store, not ambient global state, and the aggregation
//! functions stay pure. Staleness triggers a synchronous re-fetch that
//! blocks the render pass; there is no background refresh.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::BoardError;
use crate::ingest::{CamRow, DenmRow, EventStore};

/// Keyed store with a bounded time-to-live per entry.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, Arc<V>)>>,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A live entry, or `None` when absent or past its TTL. Expired entries
    /// are evicted on access.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        match entries.get(key) {
            Some((at, value)) if at.elapsed() <= self.ttl => Some(Arc::clone(value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts an entry, sweeping everything past its TTL in the same pass
    /// so entries for keys that are never asked for again cannot pile up.
    pub fn put(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.retain(|_, (at, _)| at.elapsed() <= self.ttl);
        entries.insert(key, (Instant::now(), Arc::clone(&value)));
        value
    }

    /// Number of entries currently held, live or not yet swept.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An [`EventStore`] that memoizes fetch results per `since` parameter.
pub struct CachedStore {
    inner: Box<dyn EventStore>,
    cams: TtlCache<NaiveDateTime, Vec<CamRow>>,
    denms: TtlCache<NaiveDateTime, Vec<DenmRow>>,
}

impl CachedStore {
    pub fn new(inner: Box<dyn EventStore>, ttl: Duration) -> Self {
        Self {
            inner,
            cams: TtlCache::new(ttl),
            denms: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl EventStore for CachedStore {
    async fn fetch_observations(&self, since: NaiveDateTime) -> Result<Vec<CamRow>, BoardError> {
        if let Some(hit) = self.cams.get(&since) {
            debug!(%since, "CAM fetch served from cache");
            return Ok(hit.as_ref().clone());
        }
        let rows = self.inner.fetch_observations(since).await?;
        self.cams.put(since, rows.clone());
        Ok(rows)
    }

    async fn fetch_hazards(&self, since: NaiveDateTime) -> Result<Vec<DenmRow>, BoardError> {
        if let Some(hit) = self.denms.get(&since) {
            debug!(%since, "DENM fetch served from cache");
            return Ok(hit.as_ref().clone());
        }
        let rows = self.inner.fetch_hazards(since).await?;
        self.denms.put(since, rows.clone());
        Ok(rows)
    }
}
