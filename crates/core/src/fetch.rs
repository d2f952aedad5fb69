//! Content fetching from URLs, files, and stdin.
//!
//! Entry markup comes from local files or standard input. Card pages, the
//! entry's own published page, are retrieved through a [`PageFetcher`] so
//! that formatting stays synchronous and can be tested without a network.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
#[cfg(feature = "fetch")]
use url::Url;

use crate::{CrossfeedError, Result};

/// HTTP client configuration for fetching card pages.
///
/// This struct controls timeout and user agent settings for HTTP requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; Crossfeed/1.0)".to_string() }
    }
}

/// Source of the pages card metadata is read from.
///
/// Calls block until the page is available. Implementations don't retry.
pub trait PageFetcher {
    fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Fetches HTML content from a URL.
///
/// This function performs an HTTP GET request and returns the response body as text.
/// It follows redirects and respects the configured timeout.
#[cfg(feature = "fetch")]
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| CrossfeedError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(CrossfeedError::InvalidUrl(format!("Unsupported scheme for {}", url)));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(CrossfeedError::HttpError)?;

    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() { CrossfeedError::Timeout { timeout: config.timeout } } else { CrossfeedError::HttpError(e) }
        })?
        .error_for_status()?;

    let content = response.text().await?;

    Ok(content)
}

/// Fetches card pages over HTTP.
///
/// Each call drives the request on its own single-threaded runtime, so this
/// must not be used from within an async context.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone, Default)]
pub struct HttpPageFetcher {
    config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl HttpPageFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[cfg(feature = "fetch")]
impl PageFetcher for HttpPageFetcher {
    fn fetch_page(&self, url: &str) -> Result<String> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(CrossfeedError::ConfigError(
                "HttpPageFetcher blocks and can't run inside an async runtime".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        runtime.block_on(fetch_url(url, &self.config))
    }
}

/// Serves pages from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticPageFetcher {
    pages: HashMap<String, String>,
}

impl StaticPageFetcher {
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }
}

impl PageFetcher for StaticPageFetcher {
    fn fetch_page(&self, url: &str) -> Result<String> {
        self.pages.get(url).cloned().ok_or_else(|| CrossfeedError::PageUnavailable(url.to_string()))
    }
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(CrossfeedError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(CrossfeedError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(CrossfeedError::from)?;

    Ok(buffer)
}
