//! Concurrent fan-out over all configured source adapters, with the cache as
//! a read-through/write-through layer per source.
//!
//! One adapter failing (typed error, timeout, malformed response) never
//! cancels or blocks the others: the failed source's slot degrades to an
//! empty list and the error is recorded for observability. The response
//! always carries every configured source key.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use learnscout_common::{Resource, TelemetryEvent};

use crate::cache::ResourceCache;
use crate::sources::SourceAdapter;

/// Merged per-source results for one query. Built fresh per request and owned
/// by it; never shared across requests.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub query: String,
    /// Every configured source is present, possibly with an empty list.
    pub by_source: BTreeMap<String, Vec<Resource>>,
    /// Sources that degraded this request, with the swallowed error.
    pub errors: BTreeMap<String, String>,
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    cache: Arc<dyn ResourceCache>,
}

struct SourceOutcome {
    source: &'static str,
    result: Result<Vec<Resource>, String>,
}

impl Aggregator {
    pub fn new(cache: Arc<dyn ResourceCache>) -> Self {
        Self {
            adapters: Vec::new(),
            cache,
        }
    }

    pub fn register(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Fan out to every adapter concurrently and merge once all have settled.
    pub async fn aggregate(&self, query: &str) -> AggregateResult {
        let outcomes = join_all(
            self.adapters
                .iter()
                .map(|adapter| self.run_source(adapter.as_ref(), query)),
        )
        .await;

        let mut by_source = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(records) => {
                    by_source.insert(outcome.source.to_string(), records);
                }
                Err(message) => {
                    by_source.insert(outcome.source.to_string(), Vec::new());
                    errors.insert(outcome.source.to_string(), message);
                }
            }
        }

        AggregateResult {
            query: query.to_string(),
            by_source,
            errors,
        }
    }

    /// One source: cache read-through, live fetch on miss, write-back on
    /// success. All failures are converted to an error value here — nothing
    /// propagates to sibling sources.
    async fn run_source(&self, adapter: &dyn SourceAdapter, query: &str) -> SourceOutcome {
        let kind = adapter.kind();
        let source = kind.as_str();
        let fresh_after = Utc::now() - adapter.cache_ttl();

        match self.cache.get(kind, query, fresh_after).await {
            Ok(Some(entry)) => {
                TelemetryEvent::SourceFetched {
                    source: source.to_string(),
                    query: query.to_string(),
                    count: entry.records.len() as u32,
                    from_cache: true,
                }
                .emit();
                return SourceOutcome {
                    source,
                    result: Ok(entry.records),
                };
            }
            Ok(None) => {}
            // A broken cache downgrades to a live fetch, not a failed source.
            Err(e) => warn!(source, query, error = %e, "Cache read failed; fetching live"),
        }

        match adapter.fetch(query).await {
            Ok(records) => {
                if let Err(e) = self.cache.put(kind, query, &records).await {
                    TelemetryEvent::CacheWriteFailed {
                        source: source.to_string(),
                        query: query.to_string(),
                        error: e.to_string(),
                    }
                    .emit();
                }
                TelemetryEvent::SourceFetched {
                    source: source.to_string(),
                    query: query.to_string(),
                    count: records.len() as u32,
                    from_cache: false,
                }
                .emit();
                SourceOutcome {
                    source,
                    result: Ok(records),
                }
            }
            Err(e) => {
                TelemetryEvent::SourceFailed {
                    source: source.to_string(),
                    query: query.to_string(),
                    error: e.to_string(),
                }
                .emit();
                SourceOutcome {
                    source,
                    result: Err(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::UdemyAdapter;
    use crate::testing::{MemoryCache, ScriptedAdapter};
    use browser_session::testing::ScriptedLauncher;
    use browser_session::SessionManager;
    use learnscout_common::SourceKind;
    use std::sync::atomic::Ordering;

    fn record(query: &str, title: &str, link: &str) -> Resource {
        Resource::new(query, title, link)
    }

    #[tokio::test]
    async fn merges_all_sources_by_name() {
        let cache = Arc::new(MemoryCache::new());
        let video = vec![
            record("docker", "Docker Playlist 1", "https://youtube.com/p1"),
            record("docker", "Docker Playlist 2", "https://youtube.com/p2"),
        ];
        let scraped = vec![
            record("docker", "S1", "https://udemy.com/1"),
            record("docker", "S2", "https://udemy.com/2"),
            record("docker", "S3", "https://udemy.com/3"),
        ];

        let aggregator = Aggregator::new(cache)
            .register(Arc::new(ScriptedAdapter::ok(SourceKind::Youtube, video)))
            .register(Arc::new(ScriptedAdapter::ok(SourceKind::Coursera, Vec::new())))
            .register(Arc::new(ScriptedAdapter::ok(SourceKind::Udemy, scraped)));

        let result = aggregator.aggregate("docker").await;

        assert_eq!(result.query, "docker");
        assert_eq!(result.by_source["youtube"].len(), 2);
        assert_eq!(result.by_source["coursera"].len(), 0);
        assert_eq!(result.by_source["udemy"].len(), 3);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn one_failing_source_does_not_poison_the_rest() {
        let cache = Arc::new(MemoryCache::new());
        let aggregator = Aggregator::new(cache)
            .register(Arc::new(ScriptedAdapter::failing(SourceKind::Youtube)))
            .register(Arc::new(ScriptedAdapter::ok(
                SourceKind::Coursera,
                vec![record("rust", "Rust Course", "https://coursera.org/rust")],
            )));

        let result = aggregator.aggregate("rust").await;

        // The failed source is present with an empty list, never absent.
        assert_eq!(result.by_source["youtube"].len(), 0);
        assert_eq!(result.by_source["coursera"].len(), 1);
        assert!(result.errors.contains_key("youtube"));
        assert!(!result.errors.contains_key("coursera"));
    }

    #[tokio::test]
    async fn fresh_cache_entry_skips_the_adapter_entirely() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .put(
                SourceKind::Youtube,
                "python",
                &[record("python", "Cached", "https://youtube.com/cached")],
            )
            .await
            .unwrap();

        let adapter = ScriptedAdapter::ok(SourceKind::Youtube, vec![record("python", "Live", "https://youtube.com/live")]);
        let calls = adapter.calls();
        let aggregator = Aggregator::new(cache).register(Arc::new(adapter));

        let result = aggregator.aggregate("python").await;

        assert_eq!(result.by_source["youtube"][0].title, "Cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fresh_cache_entry_means_zero_browser_launches() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .put(
                SourceKind::Udemy,
                "python",
                &[record("python", "Cached Course", "https://udemy.com/cached")],
            )
            .await
            .unwrap();

        let launcher = ScriptedLauncher::with_html("<html></html>");
        let launches = launcher.launches();
        let aggregator = Aggregator::new(cache).register(Arc::new(UdemyAdapter::new(
            SessionManager::new(Arc::new(launcher)),
        )));

        let result = aggregator.aggregate("python").await;

        assert_eq!(result.by_source["udemy"][0].title, "Cached Course");
        assert_eq!(launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_cache_entry_triggers_a_live_fetch() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .put(
                SourceKind::Youtube,
                "go",
                &[record("go", "Old", "https://youtube.com/old")],
            )
            .await
            .unwrap();
        // Age the entry past any adapter TTL.
        cache.age_all(chrono::Duration::hours(48)).await;

        let adapter = ScriptedAdapter::ok(
            SourceKind::Youtube,
            vec![record("go", "Fresh", "https://youtube.com/fresh")],
        );
        let calls = adapter.calls();
        let aggregator = Aggregator::new(cache).register(Arc::new(adapter));

        let result = aggregator.aggregate("go").await;

        assert_eq!(result.by_source["youtube"][0].title, "Fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn successful_fetch_writes_back_to_the_cache() {
        let cache = Arc::new(MemoryCache::new());
        let adapter = ScriptedAdapter::ok(
            SourceKind::Coursera,
            vec![record("ml", "ML Course", "https://coursera.org/ml")],
        );
        let calls = adapter.calls();
        let aggregator = Aggregator::new(cache.clone()).register(Arc::new(adapter));

        aggregator.aggregate("ml").await;
        let second = aggregator.aggregate("ml").await;

        // Second request is served from cache; the adapter ran exactly once.
        assert_eq!(second.by_source["coursera"][0].title, "ML Course");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn within_source_order_is_preserved() {
        let cache = Arc::new(MemoryCache::new());
        let records = vec![
            record("rust", "First", "https://youtube.com/1"),
            record("rust", "Second", "https://youtube.com/2"),
            record("rust", "Third", "https://youtube.com/3"),
        ];
        let aggregator = Aggregator::new(cache)
            .register(Arc::new(ScriptedAdapter::ok(SourceKind::Youtube, records)));

        // Live fetch, then cached read: order must hold on both paths.
        for _ in 0..2 {
            let result = aggregator.aggregate("rust").await;
            let titles: Vec<&str> = result.by_source["youtube"]
                .iter()
                .map(|r| r.title.as_str())
                .collect();
            assert_eq!(titles, vec!["First", "Second", "Third"]);
        }
    }
}
