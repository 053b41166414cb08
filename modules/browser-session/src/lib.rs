//! Scoped browser-session management for scripted scraping.
//!
//! Sources without a structured API are read by driving a real headless
//! browser. A session is an expensive, failure-prone external resource, so
//! every use goes through [`SessionManager::with_session`]: acquire a session
//! (launch plus liveness check, under a bounded timeout), run the body, and
//! release the session on every exit path.

pub mod error;
pub mod launch;
pub mod remote;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{Result, SessionError};
pub use launch::{LaunchOptions, DEFAULT_USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
pub use remote::RemoteBrowserLauncher;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::warn;

/// Default bound on page navigation, including rendering.
pub const DEFAULT_NAV_TIMEOUT: Duration = Duration::from_secs(30);
/// Default bound on waiting for a content selector to appear.
pub const DEFAULT_SELECTOR_TIMEOUT: Duration = Duration::from_secs(15);
/// Bound on session acquisition (launch + liveness check).
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(20);

/// One navigation order: where to go and what must appear before the page
/// counts as rendered.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    /// CSS selector (may be a comma-joined candidate list) that must appear
    /// in the rendered DOM. None skips the wait.
    pub wait_for_selector: Option<String>,
    pub nav_timeout: Duration,
    pub selector_timeout: Duration,
}

impl PageRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            wait_for_selector: None,
            nav_timeout: DEFAULT_NAV_TIMEOUT,
            selector_timeout: DEFAULT_SELECTOR_TIMEOUT,
        }
    }

    pub fn wait_for(mut self, selector: impl Into<String>) -> Self {
        self.wait_for_selector = Some(selector.into());
        self
    }
}

/// A fully rendered page, verified to come from the expected origin with a
/// non-empty document body.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub final_url: String,
    pub html: String,
    pub status: u16,
}

/// One acquired, isolated browser instance. Exclusively owned by the
/// invocation that acquired it; never shared across requests.
#[async_trait]
pub trait Browser: Send {
    /// Version string reported by the browser at launch. Non-empty for a
    /// live session.
    fn version(&self) -> &str;

    /// Navigate, wait for content, and verify the result (origin match,
    /// non-empty body). Sequential with respect to other calls on the same
    /// session.
    async fn goto(&mut self, req: &PageRequest) -> Result<RenderedPage>;

    /// Release the underlying browser. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Browser>>;
}

/// Acquires browser sessions and guarantees their release.
#[derive(Clone)]
pub struct SessionManager {
    launcher: Arc<dyn BrowserLauncher>,
    launch_timeout: Duration,
}

impl SessionManager {
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            launcher,
            launch_timeout: LAUNCH_TIMEOUT,
        }
    }

    pub fn with_launch_timeout(mut self, timeout: Duration) -> Self {
        self.launch_timeout = timeout;
        self
    }

    /// Acquire a session, run `body` against it, and close the session no
    /// matter how the body exits.
    ///
    /// Acquisition fails with [`SessionError::Acquisition`] if the launcher
    /// errors, exceeds the launch timeout, or reports an empty version string
    /// (the liveness check).
    pub async fn with_session<T>(
        &self,
        body: impl for<'a> FnOnce(&'a mut dyn Browser) -> BoxFuture<'a, Result<T>>,
    ) -> Result<T> {
        let mut session = tokio::time::timeout(self.launch_timeout, self.launcher.launch())
            .await
            .map_err(|_| {
                SessionError::Acquisition(format!(
                    "browser launch exceeded {}s",
                    self.launch_timeout.as_secs()
                ))
            })??;

        if session.version().trim().is_empty() {
            let _ = session.close().await;
            return Err(SessionError::Acquisition(
                "browser reported no version string".to_string(),
            ));
        }

        let result = body(session.as_mut()).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        result
    }
}
