//! Course search via the Coursera catalog API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use learnscout_common::{Resource, SourceKind};

use crate::error::{Result, SourceError};
use crate::sources::SourceAdapter;

const MAX_RESULTS: u32 = 10;
const FIELDS: &str = "name,description,workload,instructorIds,partnerIds,photoUrl,slug";
const INCLUDES: &str = "instructorIds,partnerIds";

pub struct CourseraAdapter {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    elements: Vec<CatalogCourse>,
}

#[derive(Debug, Deserialize)]
struct CatalogCourse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    workload: Option<String>,
    #[serde(rename = "photoUrl")]
    photo_url: Option<String>,
    slug: Option<String>,
}

impl CourseraAdapter {
    pub fn new(api_url: &str, api_key: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_url: api_url.to_string(),
            api_key: api_key.map(String::from),
        }
    }
}

/// Flatten catalog elements into resources. Courses without a slug have no
/// canonical URL and are skipped.
fn to_resources(query: &str, elements: Vec<CatalogCourse>) -> Vec<Resource> {
    elements
        .into_iter()
        .filter_map(|course| {
            let slug = course.slug?;
            let link = format!("https://www.coursera.org/learn/{slug}");
            let mut resource = Resource::new(query, &course.name, &link);
            resource.description = course.description.filter(|d| !d.is_empty());
            resource.thumbnail_url = course.photo_url.filter(|u| !u.is_empty());
            if let Some(workload) = course.workload.filter(|w| !w.is_empty()) {
                resource = resource.with_extra("workload", workload);
            }
            Some(resource)
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for CourseraAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Coursera
    }

    fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(6)
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Resource>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingApiKey("coursera"))?;

        // The "free" qualifier biases the catalog search toward free courses.
        let search_term = format!("{query} free");

        let resp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", "search"),
                ("query", &search_term),
                ("includes", INCLUDES),
                ("limit", &MAX_RESULTS.to_string()),
                ("fields", FIELDS),
            ])
            .bearer_auth(key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: CatalogResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        let resources = to_resources(query, data.elements);
        info!(query, count = resources.len(), "Coursera catalog search complete");
        Ok(resources)
    }
}
