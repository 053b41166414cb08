//! One adapter per external provider. Each adapter encapsulates its source's
//! quirks (auth, pagination caps, markup brittleness) behind a single
//! `fetch(query)` capability.

pub mod coursera;
pub mod medium;
pub mod udemy;
pub mod youtube;

pub use coursera::CourseraAdapter;
pub use medium::MediumAdapter;
pub use udemy::UdemyAdapter;
pub use youtube::YoutubeAdapter;

use async_trait::async_trait;

use learnscout_common::{Resource, SourceKind};

use crate::error::Result;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// How long a cached entry for this source stays fresh. Scraped sources
    /// get a long TTL because a miss costs a browser session; API sources a
    /// shorter one because a miss is one cheap HTTP call.
    fn cache_ttl(&self) -> chrono::Duration;

    /// One attempt, no retries: the cache amortizes cost across requests.
    /// Records are returned in extraction order.
    async fn fetch(&self, query: &str) -> Result<Vec<Resource>>;
}
