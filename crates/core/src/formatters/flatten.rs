//! Per-silo policies for hyperlinks.
//!
//! A [`UrlFlattener`] decides how a hyperlink reads once markup is reduced to
//! plain text, and how wide the silo will count its URL. Flatteners that
//! collect link spans carry per-call state, so every formatting call needs its
//! own instance.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use super::context::TextBudget;

/// Width Twitter and Mastodon count for any URL, whatever its real length.
pub const SHORT_URL_WIDTH: usize = 23;

/// Host serving Bluesky profile pages.
pub const BLUESKY_HOST: &str = "bsky.app";

/// Profile links by handle (`/profile/alice.bsky.social`) or by DID.
static PROFILE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/profile/(did:plc:\w+|[\w.\-]+)").expect("profile path pattern is valid"));

/// A kept link's position in the final text, in UTF-8 byte offsets.
///
/// `text` is what the link shows, so `&text[start..end] == span.text` for the
/// text the span was recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlSpan {
    pub start: usize,
    pub end: usize,
    pub url: String,
    pub text: String,
}

impl UrlSpan {
    /// Whether the span still points at its link text in `text`.
    pub fn matches(&self, text: &str) -> bool {
        text.get(self.start..self.end) == Some(self.text.as_str())
    }
}

/// Policy turning hyperlinks into silo-appropriate text.
pub trait UrlFlattener {
    /// Offers the visible text of a link to the flattener.
    ///
    /// Returning `Some` replaces the whole link with that plain text. If the
    /// flattener didn't move the budget itself, the caller accounts for the
    /// returned text. `None` defers to the generic link handling.
    fn replace_href(&mut self, text: &str, url: &str, budget: &mut TextBudget) -> Option<String>;

    /// Width the silo will count for `url`.
    fn measure_url(&self, url: &str) -> usize;

    /// Whether this flattener collects link spans for rich-text metadata, in
    /// which case URLs don't need to appear in the text itself.
    fn collects_spans(&self) -> bool {
        false
    }

    /// Forgets everything recorded during a previous pass.
    fn reset(&mut self) {}

    /// Forgets spans starting at or after `byte_offset`, once the text they
    /// were recorded for was dropped or rewritten.
    fn discard_spans_from(&mut self, _byte_offset: usize) {}

    /// Hands over the spans recorded during the last pass.
    fn take_spans(&mut self) -> Vec<UrlSpan> {
        Vec::new()
    }
}

/// Keeps links untouched and measures URLs by their length.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUrlFlattener;

impl UrlFlattener for NullUrlFlattener {
    fn replace_href(&mut self, _text: &str, _url: &str, _budget: &mut TextBudget) -> Option<String> {
        None
    }

    fn measure_url(&self, url: &str) -> usize {
        url.chars().count()
    }
}

/// For silos that shorten every link to a fixed width.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthUrlFlattener {
    width: usize,
}

impl FixedWidthUrlFlattener {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl Default for FixedWidthUrlFlattener {
    fn default() -> Self {
        Self::new(SHORT_URL_WIDTH)
    }
}

impl UrlFlattener for FixedWidthUrlFlattener {
    fn replace_href(&mut self, _text: &str, _url: &str, _budget: &mut TextBudget) -> Option<String> {
        None
    }

    fn measure_url(&self, _url: &str) -> usize {
        self.width
    }
}

/// Turns profile links on the silo's own host into `@handle` mentions and
/// keeps every other link's text, recording where it lands so the caller can
/// attach the URL as a rich-text facet.
#[derive(Debug, Clone)]
pub struct ProfileMentionFlattener {
    host: String,
    spans: Vec<UrlSpan>,
}

impl ProfileMentionFlattener {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), spans: Vec::new() }
    }

    pub fn bluesky() -> Self {
        Self::new(BLUESKY_HOST)
    }

    /// Spans recorded so far.
    pub fn spans(&self) -> &[UrlSpan] {
        &self.spans
    }

    fn mention(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        if parsed.host_str() != Some(self.host.as_str()) {
            return None;
        }
        let caps = PROFILE_PATH_RE.captures(parsed.path())?;
        Some(format!("@{}", &caps[1]))
    }
}

impl UrlFlattener for ProfileMentionFlattener {
    fn replace_href(&mut self, text: &str, url: &str, budget: &mut TextBudget) -> Option<String> {
        if let Some(mention) = self.mention(url) {
            return Some(mention);
        }

        if !text.is_empty() {
            let start = budget.byte_position();
            let end = start + text.len();
            tracing::debug!("Gathered link {}..{}: {}", start, end, url);
            self.spans.push(UrlSpan { start, end, url: url.to_string(), text: text.to_string() });
        }
        Some(text.to_string())
    }

    fn measure_url(&self, url: &str) -> usize {
        url.chars().count()
    }

    fn collects_spans(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.spans.clear();
    }

    fn discard_spans_from(&mut self, byte_offset: usize) {
        let before = self.spans.len();
        self.spans.retain(|span| span.start < byte_offset);
        if self.spans.len() < before {
            tracing::debug!("Dropped {} link span(s) from byte {}", before - self.spans.len(), byte_offset);
        }
    }

    fn take_spans(&mut self) -> Vec<UrlSpan> {
        std::mem::take(&mut self.spans)
    }
}
