use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use crate::AppState;

#[derive(Deserialize)]
pub struct ResourceParams {
    query: Option<String>,
}

/// `GET /api/resources?query=<topic>`.
///
/// A missing or blank query is the only client error. Everything else is 200
/// with best-effort partial results: a source that failed this request shows
/// up as an empty array plus an entry in `errors`, never as a missing key or
/// a failed response.
pub async fn api_resources(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResourceParams>,
) -> impl IntoResponse {
    let query = params
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());
    let Some(query) = query else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Query parameter is required"})),
        )
            .into_response();
    };

    let result = state.aggregator.aggregate(&query).await;

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "query": result.query,
            "results": result.by_source,
            "errors": result.errors,
            "fetched_at": chrono::Utc::now(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app;
    use axum::body::Body;
    use axum::http::Request;
    use learnscout_aggregator::testing::{MemoryCache, ScriptedAdapter};
    use learnscout_aggregator::Aggregator;
    use learnscout_common::{Resource, SourceKind};
    use tower::ServiceExt;

    fn test_app(adapters: Vec<ScriptedAdapter>) -> axum::Router {
        let mut aggregator = Aggregator::new(Arc::new(MemoryCache::new()));
        for adapter in adapters {
            aggregator = aggregator.register(Arc::new(adapter));
        }
        app(Arc::new(AppState { aggregator }))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_query_is_a_client_error() {
        let app = test_app(vec![]);
        let response = app
            .oneshot(Request::builder().uri("/api/resources").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn blank_query_is_a_client_error() {
        let app = test_app(vec![]);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/resources?query=%20%20")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn aggregates_all_sources_into_the_response() {
        let app = test_app(vec![
            ScriptedAdapter::ok(
                SourceKind::Youtube,
                vec![Resource::new("rust", "Rust Playlist", "https://youtube.com/p1")],
            ),
            ScriptedAdapter::ok(SourceKind::Coursera, vec![]),
        ]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/resources?query=rust")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["query"], "rust");
        assert_eq!(json["results"]["youtube"][0]["title"], "Rust Playlist");
        assert_eq!(json["results"]["coursera"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn failed_source_still_returns_ok_with_empty_slot() {
        let app = test_app(vec![
            ScriptedAdapter::failing(SourceKind::Udemy),
            ScriptedAdapter::ok(
                SourceKind::Medium,
                vec![Resource::new("go", "Go Roadmap", "https://medium.com/@x/go")],
            ),
        ]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/resources?query=go")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["results"]["udemy"].as_array().unwrap().len(), 0);
        assert_eq!(json["results"]["medium"].as_array().unwrap().len(), 1);
        assert!(json["errors"]["udemy"].is_string());
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = test_app(vec![]);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
