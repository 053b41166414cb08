//! Multi-source learning-resource aggregation: concurrent fan-out over
//! heterogeneous providers, normalized records, and a per-(source, query)
//! read-through cache so repeated queries never re-trigger expensive scrapes.

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod extract;
pub mod sources;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use aggregator::{AggregateResult, Aggregator};
pub use cache::{CacheEntry, PgResourceCache, ResourceCache};
pub use error::{CacheError, SourceError};
pub use sources::{CourseraAdapter, MediumAdapter, SourceAdapter, UdemyAdapter, YoutubeAdapter};
