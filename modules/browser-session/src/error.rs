use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Browser process failed to start or failed its post-launch liveness check.
    #[error("Session acquisition failed: {0}")]
    Acquisition(String),

    /// Page failed to load: upstream non-2xx or transport failure during navigation.
    #[error("Navigation failed for {url} (status {status})")]
    Navigation { status: u16, url: String },

    /// Navigation landed on an unexpected origin. Extracting from such a page
    /// would silently produce garbage, so it is treated as a failure.
    #[error("Navigation landed on wrong origin: expected {expected}, got {actual}")]
    WrongOrigin { expected: String, actual: String },

    /// The document rendered with an empty body.
    #[error("Navigation to {0} produced an empty document body")]
    EmptyBody(String),

    /// The expected content selector never appeared within the bounded wait.
    #[error("Timed out waiting for selector {selector:?} on {url}")]
    SelectorTimeout { selector: String, url: String },

    #[error("Network error: {0}")]
    Network(String),

    /// The session handle was used after release.
    #[error("Browser session already closed")]
    Closed,
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Network(err.to_string())
    }
}
