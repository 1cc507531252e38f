use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-GB,en;q=0.9";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// One page to retrieve
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    pub timeout: Duration,
    pub referer: Option<String>,
    /// Only meaningful for rendering fetchers
    pub ready_selector: Option<String>,
}

/// Gets the HTML of a results page, either raw or rendered
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<String>;

    /// Short name for logs
    fn strategy(&self) -> &'static str;
}

/// Plain HTTP fetcher with a browser-like request identity
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_identity(DEFAULT_USER_AGENT, DEFAULT_ACCEPT_LANGUAGE)
    }

    pub fn with_identity(user_agent: &str, accept_language: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let language = HeaderValue::from_str(accept_language)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

/// Reject bodies that cannot be a results page
fn check_document(content_type: Option<&str>, body: &str) -> Result<()> {
    if let Some(content_type) = content_type {
        if !content_type.to_ascii_lowercase().contains("html") {
            return Err(ScrapeError::MalformedDocument {
                reason: format!("unexpected content type {content_type}"),
            });
        }
    }
    if body.trim().is_empty() {
        return Err(ScrapeError::MalformedDocument {
            reason: "empty body".to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, request: &PageRequest) -> Result<String> {
        debug!("Fetching URL: {}", request.url);

        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        if let Some(referer) = &request.referer {
            builder = builder.header(REFERER, referer);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout {
                    after: request.timeout,
                }
            } else {
                ScrapeError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        check_document(content_type.as_deref(), &body)?;

        debug!("Downloaded {} bytes of HTML", body.len());
        Ok(body)
    }

    fn strategy(&self) -> &'static str {
        "http"
    }
}
