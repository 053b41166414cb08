use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use browser_session::{LaunchOptions, RemoteBrowserLauncher, SessionManager};
use learnscout_aggregator::{
    Aggregator, CourseraAdapter, MediumAdapter, PgResourceCache, ResourceCache, UdemyAdapter,
    YoutubeAdapter,
};
use learnscout_common::Config;

mod rest;

pub struct AppState {
    pub aggregator: Aggregator,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route("/api/resources", get(rest::api_resources))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("learnscout=info".parse()?))
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let cache = PgResourceCache::new(pool);
    cache.migrate().await?;
    let cache: Arc<dyn ResourceCache> = Arc::new(cache);

    let launcher = RemoteBrowserLauncher::new(
        &config.browser_base_url,
        config.browser_token.as_deref(),
        LaunchOptions {
            sandboxed: config.browser_sandboxed,
            extra_args: config.browser_extra_args.clone(),
        },
    );
    let sessions = SessionManager::new(Arc::new(launcher));

    // Adapters with missing credentials stay registered: they fail per
    // request and the aggregator degrades that source to an empty slot.
    let aggregator = Aggregator::new(cache)
        .register(Arc::new(YoutubeAdapter::new(
            &config.youtube_api_url,
            config.youtube_api_key.as_deref(),
        )))
        .register(Arc::new(CourseraAdapter::new(
            &config.coursera_api_url,
            config.coursera_api_key.as_deref(),
        )))
        .register(Arc::new(UdemyAdapter::new(sessions.clone())))
        .register(Arc::new(MediumAdapter::new(sessions)));

    let state = Arc::new(AppState { aggregator });

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "learnscout API listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
