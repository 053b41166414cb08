//! Read-through/write-through resource cache.
//!
//! The store is the only shared mutable resource across concurrent requests.
//! Writes are last-write-wins upserts keyed on `(source_kind, link)`, which
//! is sufficient because each adapter only ever writes rows it just computed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use learnscout_common::{Resource, SourceKind};

use crate::error::CacheError;

/// Cached records for one `(source_kind, query)` pair.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Records in their original extraction order.
    pub records: Vec<Resource>,
    /// Most recent write time across the entry's records.
    pub fetched_at: DateTime<Utc>,
}

#[async_trait]
pub trait ResourceCache: Send + Sync {
    /// Records for `(kind, query)` written at or after `fresh_after`.
    /// Stale entries are reported as absent; freshness policy (the TTL) is
    /// the caller's, not the store's.
    async fn get(
        &self,
        kind: SourceKind,
        query: &str,
        fresh_after: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, CacheError>;

    /// Upsert records for `(kind, query)`, keyed on `(kind, link)`,
    /// refreshing each row's fields and timestamp.
    async fn put(
        &self,
        kind: SourceKind,
        query: &str,
        records: &[Resource],
    ) -> Result<(), CacheError>;
}

// --- Postgres implementation ---

pub struct PgResourceCache {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ResourceRow {
    source_query: String,
    title: String,
    description: Option<String>,
    thumbnail_url: Option<String>,
    link: String,
    extra: serde_json::Value,
    fetched_at: DateTime<Utc>,
}

impl ResourceRow {
    fn into_resource(self) -> Resource {
        Resource {
            source_query: self.source_query,
            title: self.title,
            description: self.description,
            thumbnail_url: self.thumbnail_url,
            link: self.link,
            extra: match self.extra {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
        }
    }
}

impl PgResourceCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<(), CacheError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceCache for PgResourceCache {
    async fn get(
        &self,
        kind: SourceKind,
        query: &str,
        fresh_after: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT source_query, title, description, thumbnail_url, link, extra, fetched_at
            FROM resources
            WHERE source_kind = $1 AND source_query = $2 AND fetched_at >= $3
            ORDER BY position ASC
            "#,
        )
        .bind(kind.as_str())
        .bind(query)
        .bind(fresh_after)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let fetched_at = rows
            .iter()
            .map(|r| r.fetched_at)
            .max()
            .unwrap_or_else(Utc::now);
        let records = rows.into_iter().map(ResourceRow::into_resource).collect();

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
        let mut tx = self.pool.begin().await?;

        for (position, record) in records.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO resources
                    (source_kind, source_query, title, description, thumbnail_url,
                     link, extra, position, fetched_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
                ON CONFLICT (source_kind, link) DO UPDATE SET
                    source_query = EXCLUDED.source_query,
                    title = EXCLUDED.title,
                    description = EXCLUDED.description,
                    thumbnail_url = EXCLUDED.thumbnail_url,
                    extra = EXCLUDED.extra,
                    position = EXCLUDED.position,
                    fetched_at = now()
                "#,
            )
            .bind(kind.as_str())
            .bind(query)
            .bind(&record.title)
            .bind(&record.description)
            .bind(&record.thumbnail_url)
            .bind(&record.link)
            .bind(serde_json::Value::Object(record.extra.clone()))
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
