//! Scripted launcher and browser for tests: serve a canned page (or a canned
//! failure) and count launches and closes so resource-leak assertions are
//! possible without a real browser service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Result, SessionError};
use crate::{Browser, BrowserLauncher, PageRequest, RenderedPage};

enum Script {
    Page(RenderedPage),
    FailNavigation,
    FailLaunch,
}

pub struct ScriptedLauncher {
    script: Script,
    version: String,
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedLauncher {
    /// Every session serves this page for any navigation.
    pub fn with_page(page: RenderedPage) -> Self {
        Self::new(Script::Page(page))
    }

    /// Serve `html` as a successfully rendered page for any URL navigated to.
    pub fn with_html(html: &str) -> Self {
        Self::new(Script::Page(RenderedPage {
            final_url: String::new(),
            html: html.to_string(),
            status: 200,
        }))
    }

    /// Every navigation fails with a navigation error.
    pub fn failing_navigation() -> Self {
        Self::new(Script::FailNavigation)
    }

    /// Launch itself fails.
    pub fn failing_launch() -> Self {
        Self::new(Script::FailLaunch)
    }

    /// Sessions report an empty version string, tripping the liveness check.
    pub fn blank_version(mut self) -> Self {
        self.version = String::new();
        self
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            version: "HeadlessChrome/120.0.0.0".to_string(),
            launches: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of sessions launched so far.
    pub fn launches(&self) -> Arc<AtomicUsize> {
        self.launches.clone()
    }

    /// Counter of sessions closed so far.
    pub fn closes(&self) -> Arc<AtomicUsize> {
        self.closes.clone()
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        if matches!(self.script, Script::FailLaunch) {
            return Err(SessionError::Acquisition(
                "scripted launch failure".to_string(),
            ));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        let page = match &self.script {
            Script::Page(p) => Some(p.clone()),
            _ => None,
        };
        Ok(Box::new(ScriptedBrowser {
            page,
            version: self.version.clone(),
            closes: self.closes.clone(),
            closed: false,
        }))
    }
}

struct ScriptedBrowser {
    page: Option<RenderedPage>,
    version: String,
    closes: Arc<AtomicUsize>,
    closed: bool,
}

#[async_trait]
impl Browser for ScriptedBrowser {
    fn version(&self) -> &str {
        &self.version
    }

    async fn goto(&mut self, req: &PageRequest) -> Result<RenderedPage> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        match &self.page {
            Some(page) => {
                let mut page = page.clone();
                if page.final_url.is_empty() {
                    page.final_url = req.url.clone();
                }
                Ok(page)
            }
            None => Err(SessionError::Navigation {
                status: 502,
                url: req.url.clone(),
            }),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
