//! Launcher backed by a remote headless-Chrome rendering service
//! (Browserless-compatible REST protocol).
//!
//! Acquisition probes `GET /json/version` — the session only counts as live
//! once the service reports a browser version. Navigation posts to
//! `POST /content`, which renders the page and echoes the upstream response
//! code and final URL in `X-Response-Code` / `X-Response-URL` headers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, SessionError};
use crate::launch::{LaunchOptions, DEFAULT_USER_AGENT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::{Browser, BrowserLauncher, PageRequest, RenderedPage};

pub struct RemoteBrowserLauncher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    launch: LaunchOptions,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "Browser", default)]
    browser: String,
}

impl RemoteBrowserLauncher {
    pub fn new(base_url: &str, token: Option<&str>, launch: LaunchOptions) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            launch,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        match &self.token {
            Some(token) => format!("{}{}?token={}", self.base_url, path, token),
            None => format!("{}{}", self.base_url, path),
        }
    }
}

#[async_trait]
impl BrowserLauncher for RemoteBrowserLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        let resp = self
            .client
            .get(self.endpoint("/json/version"))
            .send()
            .await
            .map_err(|e| SessionError::Acquisition(format!("version probe failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SessionError::Acquisition(format!(
                "version probe returned status {status}"
            )));
        }

        let info: VersionInfo = resp
            .json()
            .await
            .map_err(|e| SessionError::Acquisition(format!("malformed version response: {e}")))?;

        info!(version = %info.browser, "Browser session acquired");

        Ok(Box::new(RemoteBrowser {
            client: self.client.clone(),
            content_endpoint: self.endpoint("/content"),
            launch_args: self.launch.chrome_args(),
            version: info.browser,
            closed: false,
        }))
    }
}

struct RemoteBrowser {
    client: reqwest::Client,
    content_endpoint: String,
    launch_args: Vec<String>,
    version: String,
    closed: bool,
}

#[async_trait]
impl Browser for RemoteBrowser {
    fn version(&self) -> &str {
        &self.version
    }

    async fn goto(&mut self, req: &PageRequest) -> Result<RenderedPage> {
        if self.closed {
            return Err(SessionError::Closed);
        }

        let requested = Url::parse(&req.url)
            .map_err(|e| SessionError::Network(format!("invalid URL {}: {e}", req.url)))?;

        let mut body = serde_json::json!({
            "url": req.url,
            "gotoOptions": {
                "waitUntil": "networkidle2",
                "timeout": req.nav_timeout.as_millis() as u64,
            },
            "userAgent": DEFAULT_USER_AGENT,
            "viewport": {
                "width": VIEWPORT_WIDTH,
                "height": VIEWPORT_HEIGHT,
                "deviceScaleFactor": 1,
            },
            "launch": { "args": self.launch_args },
        });
        if let Some(selector) = &req.wait_for_selector {
            body["waitForSelector"] = serde_json::json!({
                "selector": selector,
                "timeout": req.selector_timeout.as_millis() as u64,
            });
        }

        debug!(url = %req.url, wait_for = ?req.wait_for_selector, "Navigating");

        let resp = self
            .client
            .post(&self.content_endpoint)
            .header("Content-Type", "application/json")
            .timeout(req.nav_timeout + req.selector_timeout + Duration::from_secs(5))
            .json(&body)
            .send()
            .await?;

        let service_status = resp.status();
        let final_url = resp
            .headers()
            .get("x-response-url")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(&req.url)
            .to_string();
        let upstream_status: u16 = resp
            .headers()
            .get("x-response-code")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| service_status.as_u16());

        if !service_status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(render_failure(req, service_status.as_u16(), &message));
        }

        let html = resp.text().await?;
        verify_rendered(req, &requested, upstream_status, &final_url, &html)?;

        debug!(url = %req.url, bytes = html.len(), "Page rendered");

        Ok(RenderedPage {
            final_url,
            html,
            status: upstream_status,
        })
    }

    async fn close(&mut self) -> Result<()> {
        // The rendering service tears the browser down when the content
        // request completes; closing invalidates this handle.
        self.closed = true;
        Ok(())
    }
}

/// Map a non-2xx service response to a typed error. An exhausted selector
/// wait surfaces as a render failure whose message is the only signal
/// distinguishing it from a plain navigation failure.
fn render_failure(req: &PageRequest, status: u16, message: &str) -> SessionError {
    if let Some(selector) = &req.wait_for_selector {
        let message = message.to_lowercase();
        if message.contains("selector") || message.contains("waiting failed") {
            return SessionError::SelectorTimeout {
                selector: selector.clone(),
                url: req.url.clone(),
            };
        }
    }
    SessionError::Navigation {
        status,
        url: req.url.clone(),
    }
}

/// Verify a rendered page: upstream 2xx, landing URL on the requested origin,
/// non-empty document body.
fn verify_rendered(
    req: &PageRequest,
    requested: &Url,
    upstream_status: u16,
    final_url: &str,
    html: &str,
) -> Result<()> {
    if !(200..300).contains(&upstream_status) {
        return Err(SessionError::Navigation {
            status: upstream_status,
            url: req.url.clone(),
        });
    }

    // Redirects within the same origin are fine; a different origin means
    // we are looking at a block page or an interstitial, not results.
    if let Ok(landed) = Url::parse(final_url) {
        if landed.origin() != requested.origin() {
            return Err(SessionError::WrongOrigin {
                expected: requested.origin().ascii_serialization(),
                actual: landed.origin().ascii_serialization(),
            });
        }
    }

    if html.trim().is_empty() {
        return Err(SessionError::EmptyBody(req.url.clone()));
    }

    Ok(())
}
