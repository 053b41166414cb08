//! Launch-flag resolution. All environment-specific Chromium arguments are
//! derived here, once, from a single options struct — call sites never branch
//! on the environment themselves.

/// User agent presented to scraped sites. Headless defaults get blocked.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// How a browser session should be launched.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// When false (restricted container environments), the no-sandbox arg set
    /// is added so Chromium can run without a usable user namespace.
    pub sandboxed: bool,
    /// Extra Chromium arguments appended verbatim after the resolved set.
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            sandboxed: true,
            extra_args: Vec::new(),
        }
    }
}

impl LaunchOptions {
    pub fn restricted() -> Self {
        Self {
            sandboxed: false,
            extra_args: Vec::new(),
        }
    }

    /// Resolve the concrete Chromium argument list.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-accelerated-2d-canvas".to_string(),
        ];
        if !self.sandboxed {
            args.insert(0, "--no-sandbox".to_string());
            args.insert(1, "--disable-setuid-sandbox".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
