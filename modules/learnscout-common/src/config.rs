use std::env;

/// Application configuration loaded from environment variables.
///
/// Provider credentials are optional: an adapter with a missing key stays
/// registered and fails per-request, which the aggregator degrades into an
/// empty result slot for that source.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres (resource cache)
    pub database_url: String,

    // YouTube Data API
    pub youtube_api_key: Option<String>,
    pub youtube_api_url: String,

    // Coursera catalog API
    pub coursera_api_key: Option<String>,
    pub coursera_api_url: String,

    // Headless browser service
    pub browser_base_url: String,
    pub browser_token: Option<String>,
    /// False in restricted container environments where Chromium needs the
    /// no-sandbox arg set.
    pub browser_sandboxed: bool,
    pub browser_extra_args: Vec<String>,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            youtube_api_key: env::var("YOUTUBE_API_KEY").ok().filter(|v| !v.is_empty()),
            youtube_api_url: env::var("YOUTUBE_API_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3/search".to_string()),
            coursera_api_key: env::var("COURSERA_API_KEY").ok().filter(|v| !v.is_empty()),
            coursera_api_url: env::var("COURSERA_API_URL")
                .unwrap_or_else(|_| "https://api.coursera.org/api/courses.v1".to_string()),
            browser_base_url: env::var("BROWSER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            browser_token: env::var("BROWSER_TOKEN").ok().filter(|v| !v.is_empty()),
            browser_sandboxed: env::var("BROWSER_SANDBOXED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            browser_extra_args: env::var("BROWSER_EXTRA_ARGS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
