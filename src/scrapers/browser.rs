use crate::error::{Result, ScrapeError};
use crate::scrapers::fetcher::{
    PageFetcher, PageRequest, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT,
};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pause after the ready selector shows up, so late cards can attach
const SETTLE_DELAY: Duration = Duration::from_millis(1500);

const CONSENT_SCRIPT: &str = r#"
    const button = document.querySelector('button[id*="accept"], button[title*="Accept"], #onetrust-accept-btn-handler');
    if (button) button.click();
"#;

fn render_error(context: &str, err: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Render(format!("{context}: {err}"))
}

/// Point in time a render must be finished by.
///
/// The blocking render thread is not cancelled when the adapter's timeout
/// fires, so every blocking step is bounded by what is left of the budget.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// Time left, or `Timeout` once it is used up
    pub fn remaining(&self) -> Result<Duration> {
        match self.at.checked_duration_since(Instant::now()) {
            Some(left) if !left.is_zero() => Ok(left),
            _ => Err(ScrapeError::Timeout { after: self.budget }),
        }
    }
}

/// A headless Chrome process with one tab.
///
/// The tab is closed when the session drops, and dropping the `Browser`
/// kills the process, so every exit path from a render tears both down.
pub struct RenderSession {
    tab: Arc<Tab>,
    // Dropped after the tab; this is what kills the Chrome process
    _browser: Browser,
}

impl RenderSession {
    pub fn open(user_agent: &str, accept_language: &str, timeout: Duration) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .idle_browser_timeout(timeout + Duration::from_secs(5))
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
            ])
            .build()
            .map_err(|e| render_error("Failed to build launch options", e))?;

        let browser =
            Browser::new(options).map_err(|e| render_error("Failed to launch Chrome browser", e))?;
        let tab = browser
            .new_tab()
            .map_err(|e| render_error("Failed to open tab", e))?;
        tab.set_default_timeout(timeout);
        tab.set_user_agent(user_agent, Some(accept_language), None)
            .map_err(|e| render_error("Failed to set user agent", e))?;

        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    /// Bound the tab's next blocking call by what is left of `deadline`
    fn step(&self, deadline: &Deadline) -> Result<()> {
        self.tab.set_default_timeout(deadline.remaining()?);
        Ok(())
    }

    /// Navigate and return the rendered DOM, giving up at `deadline`
    pub fn render(&self, request: &PageRequest, deadline: &Deadline) -> Result<String> {
        if let Some(referer) = &request.referer {
            let headers = HashMap::from([("Referer", referer.as_str())]);
            self.tab
                .set_extra_http_headers(headers)
                .map_err(|e| render_error("Failed to set referer", e))?;
        }

        debug!("Navigating to {}", request.url);
        self.step(deadline)?;
        self.tab
            .navigate_to(&request.url)
            .map_err(|e| render_error("Navigation failed", e))?;
        self.step(deadline)?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| render_error("Navigation did not finish", e))?;

        let _ = self.tab.evaluate(CONSENT_SCRIPT, false);

        if let Some(selector) = request.ready_selector.as_deref() {
            self.step(deadline)?;
            // Capture whatever rendered; the locator chain decides if it is usable
            if let Err(e) = self.tab.wait_for_element(selector) {
                warn!("Ready selector '{}' never appeared: {}", selector, e);
            } else {
                thread::sleep(SETTLE_DELAY.min(deadline.remaining()?));
            }
        }

        self.step(deadline)?;
        let html = self
            .tab
            .get_content()
            .map_err(|e| render_error("Could not read page HTML", e))?;
        if html.trim().is_empty() {
            return Err(ScrapeError::MalformedDocument {
                reason: "rendered page is empty".to_string(),
            });
        }
        info!("Captured {} bytes of rendered HTML", html.len());
        Ok(html)
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            debug!("Tab close failed during teardown: {}", e);
        }
        debug!("Render session torn down");
    }
}

/// Fetches pages by rendering them in a fresh headless Chrome session.
///
/// Much slower than `HttpFetcher`; reserved for sources that build their
/// results client-side.
pub struct BrowserFetcher {
    user_agent: String,
    accept_language: String,
}

impl BrowserFetcher {
    pub fn new() -> Self {
        Self::with_identity(DEFAULT_USER_AGENT, DEFAULT_ACCEPT_LANGUAGE)
    }

    pub fn with_identity(user_agent: impl Into<String>, accept_language: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept_language: accept_language.into(),
        }
    }
}

impl Default for BrowserFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(&self, request: &PageRequest) -> Result<String> {
        let user_agent = self.user_agent.clone();
        let accept_language = self.accept_language.clone();
        let request = request.clone();

        // headless_chrome blocks, keep it off the async workers
        tokio::task::spawn_blocking(move || {
            let deadline = Deadline::after(request.timeout);
            let session = RenderSession::open(&user_agent, &accept_language, request.timeout)?;
            session.render(&request, &deadline)
        })
        .await
        .map_err(|e| ScrapeError::Task(e.to_string()))?
    }

    fn strategy(&self) -> &'static str {
        "browser"
    }
}
