//! Error types for Crossfeed operations.
//!
//! This module defines the main error type [`CrossfeedError`] which represents
//! all possible errors that can occur while formatting an entry, fetching a
//! card page, or reading entry markup.
//!
//! Formatting errors are scoped to one entry and one silo. Callers processing
//! a whole feed should log them and move on to the next entry.
//!
//! # Example
//!
//! ```rust
//! use crossfeed_core::{CrossfeedError, Result};
//!
//! fn post_text(text: &str) -> Result<String> {
//!     if text.is_empty() {
//!         return Err(CrossfeedError::ContentUnavailable { url: None });
//!     }
//!     Ok(text.to_string())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for entry formatting operations.
///
/// # Example
///
/// ```rust
/// use crossfeed_core::{CrossfeedError, Entry, FormatOptions, NullUrlFlattener};
/// use crossfeed_core::format_entry_with_fetcher;
///
/// let entry = Entry::builder().html("<div></div>").build();
/// let fetcher = crossfeed_core::StaticPageFetcher::default();
/// match format_entry_with_fetcher(&entry, &FormatOptions::default(), &mut NullUrlFlattener, &fetcher) {
///     Ok(card) => println!("{}", card.text),
///     Err(CrossfeedError::ContentUnavailable { .. }) => println!("nothing to post"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum CrossfeedError {
    /// No usable text was found for an entry.
    ///
    /// Neither the card metadata nor the entry markup produced any text.
    #[error("Can't find any text to post for entry: {}", url.as_deref().unwrap_or("<no url>"))]
    ContentUnavailable { url: Option<String> },

    /// The character limit can't even hold the mandatory trailing URL.
    #[error("Limit of {limit} characters leaves no room for text after reserving {reserved} for the URL")]
    LimitUnsatisfiable { limit: usize, reserved: usize },

    /// Placeholder bookkeeping went out of sync with the recorded URLs.
    ///
    /// This is a logic defect and is never recovered from.
    #[error("URL placeholder mismatch: {0}")]
    PlaceholderMismatch(String),

    /// HTTP request errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read and write errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A card page couldn't be retrieved.
    #[error("Page unavailable: {0}")]
    PageUnavailable(String),

    /// A media property held something other than a URL or `{value, alt}`.
    #[error("Unexpected media item: {0}")]
    InvalidMedia(String),

    /// JSON serialization errors.
    #[error("Failed to serialize output: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// A post cache file couldn't be understood.
    #[error("Invalid post cache {}: {message}", path.display())]
    CacheError { path: PathBuf, message: String },

    /// Invalid options or silo profile.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for CrossfeedError.
pub type Result<T> = std::result::Result<T, CrossfeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CrossfeedError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_content_unavailable_mentions_url() {
        let err = CrossfeedError::ContentUnavailable { url: Some("https://example.org/a".to_string()) };
        assert!(err.to_string().contains("https://example.org/a"));

        let err = CrossfeedError::ContentUnavailable { url: None };
        assert!(err.to_string().contains("<no url>"));
    }

    #[test]
    fn test_limit_unsatisfiable_error() {
        let err = CrossfeedError::LimitUnsatisfiable { limit: 20, reserved: 24 };
        assert!(err.to_string().contains("20"));
        assert!(err.to_string().contains("24"));
    }

    #[test]
    fn test_timeout_error() {
        let err = CrossfeedError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
