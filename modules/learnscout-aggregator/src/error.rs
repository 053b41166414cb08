use browser_session::SessionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

/// Everything a source adapter can fail with. Each variant is caught at the
/// aggregator boundary and degraded into an empty result slot for that source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("API key not configured for {0}")]
    MissingApiKey(&'static str),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Browser acquisition, navigation, or selector-wait failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Navigation succeeded but no result card matched any candidate selector.
    #[error("No result cards matched any candidate selector on {url}")]
    SelectorExhaustion { url: String },
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
