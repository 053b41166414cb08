//! In-memory cache and scripted adapters for tests. The memory cache mirrors
//! the Postgres store's contract exactly: upsert keyed on `(kind, link)`,
//! freshness filtering on read, extraction order preserved.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use learnscout_common::{Resource, SourceKind};

use crate::cache::{CacheEntry, ResourceCache};
use crate::error::{CacheError, SourceError};
use crate::sources::SourceAdapter;

struct StoredRow {
    resource: Resource,
    fetched_at: DateTime<Utc>,
    position: usize,
}

#[derive(Default)]
pub struct MemoryCache {
    rows: Mutex<HashMap<SourceKind, Vec<StoredRow>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows for a source, across all queries.
    pub async fn row_count(&self, kind: SourceKind) -> usize {
        self.rows
            .lock()
            .await
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Shift every stored timestamp into the past, for staleness tests.
    pub async fn age_all(&self, by: Duration) {
        let mut rows = self.rows.lock().await;
        for stored in rows.values_mut().flatten() {
            stored.fetched_at = stored.fetched_at - by;
        }
    }
}

#[async_trait]
impl ResourceCache for MemoryCache {
    async fn get(
        &self,
        kind: SourceKind,
        query: &str,
        fresh_after: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let rows = self.rows.lock().await;
        let Some(stored) = rows.get(&kind) else {
            return Ok(None);
        };

        let mut hits: Vec<&StoredRow> = stored
            .iter()
            .filter(|row| row.resource.source_query == query && row.fetched_at >= fresh_after)
            .collect();
        if hits.is_empty() {
            return Ok(None);
        }
        hits.sort_by_key(|row| row.position);

        let fetched_at = hits
            .iter()
            .map(|row| row.fetched_at)
            .max()
            .unwrap_or_else(Utc::now);
        let records = hits.into_iter().map(|row| row.resource.clone()).collect();

        Ok(Some(CacheEntry {
            records,
            fetched_at,
        }))
    }

    async fn put(
        &self,
        kind: SourceKind,
        query: &str,
        records: &[Resource],
    ) -> Result<(), CacheError> {
        let mut rows = self.rows.lock().await;
        let stored = rows.entry(kind).or_default();

        for (position, record) in records.iter().enumerate() {
            let mut resource = record.clone();
            resource.source_query = query.to_string();

            match stored.iter_mut().find(|row| row.resource.link == record.link) {
                Some(existing) => {
                    existing.resource = resource;
                    existing.fetched_at = Utc::now();
                    existing.position = position;
                }
                None => stored.push(StoredRow {
                    resource,
                    fetched_at: Utc::now(),
                    position,
                }),
            }
        }

        Ok(())
    }
}

/// Adapter that returns a canned result (or a canned failure) and counts how
/// often it was actually invoked.
pub struct ScriptedAdapter {
    kind: SourceKind,
    records: Option<Vec<Resource>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
    pub fn ok(kind: SourceKind, records: Vec<Resource>) -> Self {
        Self {
            kind,
            records: Some(records),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(kind: SourceKind) -> Self {
        Self {
            kind,
            records: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of live fetches performed.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn cache_ttl(&self) -> Duration {
        Duration::hours(6)
    }

    async fn fetch(&self, _query: &str) -> Result<Vec<Resource>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.records {
            Some(records) => Ok(records.clone()),
            None => Err(SourceError::Api {
                status: 503,
                message: "scripted failure".to_string(),
            }),
        }
    }
}
