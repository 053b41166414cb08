use serde::{Deserialize, Serialize};
use std::fmt;

/// The external providers the aggregator knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Youtube,
    Coursera,
    Udemy,
    Medium,
}

impl SourceKind {
    /// Stable lowercase name, used as the cache partition key and as the
    /// per-source key in aggregate responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Youtube => "youtube",
            SourceKind::Coursera => "coursera",
            SourceKind::Udemy => "udemy",
            SourceKind::Medium => "medium",
        }
    }

    pub fn all() -> [SourceKind; 4] {
        [
            SourceKind::Youtube,
            SourceKind::Coursera,
            SourceKind::Udemy,
            SourceKind::Medium,
        ]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The common shape every provider's results are flattened into.
///
/// `link` is the natural unique identifier within a source kind: re-fetching
/// the same query updates the existing record in place rather than creating
/// a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// The search term this record was fetched for.
    pub source_query: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Canonical external URL. Unique per source kind.
    pub link: String,
    /// Source-specific fields (channel, rating, workload, author).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Resource {
    pub fn new(source_query: &str, title: &str, link: &str) -> Self {
        Self {
            source_query: source_query.to_string(),
            title: title.to_string(),
            description: None,
            thumbnail_url: None,
            link: link.to_string(),
            extra: serde_json::Map::new(),
        }
    }

    /// Attach a source-specific field.
    pub fn with_extra(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}
