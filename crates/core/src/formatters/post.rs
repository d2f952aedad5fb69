//! Entry formatting: fitting an entry into a silo's post.
//!
//! [`format_entry_with_fetcher`] resolves a [`Card`] for the entry, decides
//! whether the entry's URL goes at the end of the post, and when a limit is
//! set shortens the text so that text and URL fit together.
//!
//! # Example
//!
//! ```rust
//! use crossfeed_core::{AddUrl, Entry, FormatOptions, NullUrlFlattener, StaticPageFetcher};
//! use crossfeed_core::format_entry_with_fetcher;
//!
//! let entry = Entry::from_html(
//!     Some("https://example.org/article"),
//!     r#"<h1 class="p-name">A short title</h1><div class="e-content">The article body</div>"#,
//! );
//! let options = FormatOptions::builder().limit(80).add_url(AddUrl::Auto).build();
//!
//! let card = format_entry_with_fetcher(&entry, &options, &mut NullUrlFlattener, &StaticPageFetcher::default())
//!     .unwrap();
//! assert_eq!(card.text, "A short title https://example.org/article");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::card::{Card, CardProps, CardSource, best_text_card, get_best_text, get_card_info};
use super::context::{UrlMode, shorten_plain};
use super::flatten::UrlFlattener;
use super::strip::StripContext;
use crate::entry::Entry;
use crate::fetch::PageFetcher;
use crate::{CrossfeedError, Result};

/// When the entry's own URL is appended to the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddUrl {
    /// For articles, and for microposts that had to be shortened.
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for AddUrl {
    type Err = CrossfeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(AddUrl::Auto),
            "always" | "true" | "yes" => Ok(AddUrl::Always),
            "never" | "false" | "no" => Ok(AddUrl::Never),
            _ => Err(CrossfeedError::ConfigError(format!("Unknown add-url policy: {}", s))),
        }
    }
}

impl fmt::Display for AddUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddUrl::Auto => "auto",
            AddUrl::Always => "always",
            AddUrl::Never => "never",
        })
    }
}

/// Options for formatting an entry for one silo.
///
/// # Example
///
/// ```rust
/// use crossfeed_core::{AddUrl, CardProps, FormatOptions, UrlMode};
///
/// let options = FormatOptions::builder()
///     .limit(500)
///     .card_props(CardProps::open_graph())
///     .add_url(AddUrl::Always)
///     .url_mode(UrlMode::Inline)
///     .build();
/// assert_eq!(options.limit, Some(500));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Maximum post length in characters. `None` or zero means no limit.
    pub limit: Option<usize>,

    /// Read articles' text from their page's meta tags when set.
    pub card_props: Option<CardProps>,

    pub add_url: AddUrl,

    /// Where link URLs go. Defaults to erasing them when the flattener
    /// collects link spans, and to a list at the bottom otherwise.
    pub url_mode: Option<UrlMode>,
}

impl FormatOptions {
    pub fn builder() -> FormatOptionsBuilder {
        FormatOptionsBuilder::new()
    }

    fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|limit| *limit > 0)
    }
}

/// Builder for FormatOptions.
pub struct FormatOptionsBuilder {
    options: FormatOptions,
}

impl FormatOptionsBuilder {
    pub fn new() -> Self {
        Self { options: FormatOptions::default() }
    }

    pub fn limit(mut self, value: usize) -> Self {
        self.options.limit = Some(value);
        self
    }

    pub fn card_props(mut self, value: CardProps) -> Self {
        self.options.card_props = Some(value);
        self
    }

    pub fn add_url(mut self, value: AddUrl) -> Self {
        self.options.add_url = value;
        self
    }

    pub fn url_mode(mut self, value: UrlMode) -> Self {
        self.options.url_mode = Some(value);
        self
    }

    pub fn build(self) -> FormatOptions {
        self.options
    }
}

impl Default for FormatOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats an entry, fetching card pages over HTTP.
///
/// See [`format_entry_with_fetcher`].
#[cfg(feature = "fetch")]
pub fn format_entry(entry: &Entry, options: &FormatOptions, flattener: &mut dyn UrlFlattener) -> Result<Card> {
    format_entry_with_fetcher(entry, options, flattener, &crate::fetch::HttpPageFetcher::default())
}

/// Formats an entry into a card that fits `options.limit`.
///
/// The flattener is reset first and must not be shared with another call
/// running at the same time.
///
/// # Errors
///
/// - [`CrossfeedError::ContentUnavailable`] when neither the card page nor
///   the entry markup has any text.
/// - [`CrossfeedError::LimitUnsatisfiable`] when the limit can't hold the
///   entry URL plus at least one character.
/// - Fetch errors from `fetcher` when card props are set.
pub fn format_entry_with_fetcher(
    entry: &Entry, options: &FormatOptions, flattener: &mut dyn UrlFlattener, fetcher: &dyn PageFetcher,
) -> Result<Card> {
    let url_mode = options.url_mode.unwrap_or_else(|| default_url_mode(flattener));
    let url = entry.url();

    flattener.reset();
    let (mut card, text_length) = {
        let mut ctx = StripContext::new(url_mode, &mut *flattener, None);
        let mut card = None;

        if let Some(props) = &options.card_props
            && !entry.is_micropost()
        {
            card = get_card_info(entry, props, fetcher, &mut ctx)?;
        }
        if card.is_none() {
            card = get_best_text(entry, &mut ctx)?
                .filter(|text| !text.is_empty())
                .map(|text| best_text_card(entry, text));
        }

        let card = card.ok_or_else(|| CrossfeedError::ContentUnavailable { url: url.map(str::to_string) })?;
        (card, ctx.budget().text_length())
    };

    let mut add_url = url.is_some()
        && match options.add_url {
            AddUrl::Always => true,
            AddUrl::Never => false,
            AddUrl::Auto => !entry.is_micropost(),
        };

    if let Some(limit) = options.effective_limit() {
        let url_width = url.map_or(0, |url| 1 + flattener.measure_url(url));
        let mut budget = limit;
        if add_url {
            budget = reserve(limit, budget, url_width)?;
        }

        if text_length > budget {
            if !add_url && options.add_url == AddUrl::Auto && url.is_some() {
                tracing::debug!("Shortening a micropost, adding its URL after all");
                add_url = true;
                budget = reserve(limit, budget, url_width)?;
            }

            match card.provenance {
                CardSource::BestText => {
                    // URLs inside the text may not measure what they show, so
                    // reduce again from scratch with the reduced limit.
                    tracing::debug!("Text is {} characters, re-extracting within {}", text_length, budget);
                    flattener.reset();
                    let mut ctx = StripContext::new(url_mode, &mut *flattener, Some(budget));
                    card.text = get_best_text(entry, &mut ctx)?.unwrap_or_default();
                }
                CardSource::Card => {
                    tracing::debug!("Card text is {} characters, shortening to {}", text_length, budget);
                    card.text = shorten_plain(&card.text, budget);
                }
            }
        }
    }

    let spans = flattener.take_spans();
    let recorded = spans.len();
    card.url_spans = spans.into_iter().filter(|span| span.matches(&card.text)).collect();
    if card.url_spans.len() < recorded {
        tracing::debug!("Dropped {} link span(s) not matching the final text", recorded - card.url_spans.len());
    }

    if add_url && let Some(url) = url {
        if !card.text.is_empty() {
            card.text.push(' ');
        }
        card.text.push_str(url);
    }

    Ok(card)
}

fn default_url_mode(flattener: &dyn UrlFlattener) -> UrlMode {
    if flattener.collects_spans() { UrlMode::Erase } else { UrlMode::BottomList }
}

/// Takes room for the trailing URL out of the budget, leaving at least one
/// character for the text.
fn reserve(limit: usize, budget: usize, url_width: usize) -> Result<usize> {
    if url_width >= budget {
        return Err(CrossfeedError::LimitUnsatisfiable { limit, reserved: url_width });
    }
    tracing::debug!("Reserving {} characters for the entry URL", url_width);
    Ok(budget - url_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticPageFetcher;
    use crate::formatters::flatten::{FixedWidthUrlFlattener, NullUrlFlattener, ProfileMentionFlattener, UrlSpan};
    use rstest::rstest;

    const TEST_URL: &str = "https://example.org/article";
    const LONG_TITLE: &str =
        "A test entry that is very very long because its title has many many words in it for no good reason";

    fn longform_entry(title: &str) -> Entry {
        let html = format!(
            r#"<h1 class="p-name">{}</h1><div class="e-content"><p>Nothing like the title.</p></div>"#,
            title
        );
        Entry::from_html(Some(TEST_URL), &html)
    }

    fn micropost_entry(text: &str) -> Entry {
        Entry::from_html(Some(TEST_URL), &format!(r#"<div class="e-content">{}</div>"#, text))
    }

    fn format(entry: &Entry, limit: Option<usize>, add_url: AddUrl) -> Result<Card> {
        let options = FormatOptions { limit, add_url, ..Default::default() };
        format_entry_with_fetcher(entry, &options, &mut NullUrlFlattener, &StaticPageFetcher::default())
    }

    fn with_url(text: &str) -> String {
        format!("{} {}", text, TEST_URL)
    }

    #[rstest]
    #[case("A test entry", None, AddUrl::Never, "A test entry".to_string())]
    #[case("A test entry", None, AddUrl::Auto, with_url("A test entry"))]
    #[case("A test entry", None, AddUrl::Always, with_url("A test entry"))]
    #[case("A test entry", Some(80), AddUrl::Never, "A test entry".to_string())]
    #[case("A test entry", Some(80), AddUrl::Auto, with_url("A test entry"))]
    #[case("A test entry", Some(80), AddUrl::Always, with_url("A test entry"))]
    #[case(
        LONG_TITLE,
        Some(80),
        AddUrl::Never,
        "A test entry that is very very long because its title has many many words in...".to_string()
    )]
    #[case(LONG_TITLE, Some(80), AddUrl::Auto, with_url("A test entry that is very very long because its..."))]
    #[case(LONG_TITLE, Some(80), AddUrl::Always, with_url("A test entry that is very very long because its..."))]
    fn test_format_longform_entry(
        #[case] title: &str, #[case] limit: Option<usize>, #[case] add_url: AddUrl, #[case] expected: String,
    ) {
        let card = format(&longform_entry(title), limit, add_url).unwrap();
        assert_eq!(card.text, expected);
        assert_eq!(card.provenance, CardSource::BestText);
    }

    #[rstest]
    #[case("A test entry", None, AddUrl::Never, "A test entry".to_string())]
    #[case("A test entry", None, AddUrl::Auto, "A test entry".to_string())]
    #[case("A test entry", None, AddUrl::Always, with_url("A test entry"))]
    #[case("A test entry", Some(80), AddUrl::Never, "A test entry".to_string())]
    #[case("A test entry", Some(80), AddUrl::Auto, "A test entry".to_string())]
    #[case("A test entry", Some(80), AddUrl::Always, with_url("A test entry"))]
    #[case(
        LONG_TITLE,
        Some(80),
        AddUrl::Never,
        "A test entry that is very very long because its title has many many words in...".to_string()
    )]
    #[case(LONG_TITLE, Some(80), AddUrl::Auto, with_url("A test entry that is very very long because its..."))]
    #[case(LONG_TITLE, Some(80), AddUrl::Always, with_url("A test entry that is very very long because its..."))]
    fn test_format_micropost_entry(
        #[case] text: &str, #[case] limit: Option<usize>, #[case] add_url: AddUrl, #[case] expected: String,
    ) {
        let entry = micropost_entry(text);
        assert!(entry.is_micropost());
        assert_eq!(format(&entry, limit, add_url).unwrap().text, expected);
    }

    #[test]
    fn test_result_fits_limit() {
        let entry = longform_entry(LONG_TITLE);
        for limit in [40, 60, 80, 100] {
            let card = format(&entry, Some(limit), AddUrl::Always).unwrap();
            assert!(card.text.chars().count() <= limit, "limit {} gave {:?}", limit, card.text);
            assert!(card.text.ends_with(TEST_URL));
        }
    }

    #[test]
    fn test_limit_too_small_for_url() {
        let result = format(&longform_entry(LONG_TITLE), Some(28), AddUrl::Always);
        assert!(matches!(result, Err(CrossfeedError::LimitUnsatisfiable { limit: 28, reserved: 28 })));
    }

    #[test]
    fn test_no_text_at_all() {
        let entry = Entry::from_html(Some(TEST_URL), "<div>No microformats</div>");
        let result = format(&entry, Some(80), AddUrl::Auto);
        assert!(matches!(result, Err(CrossfeedError::ContentUnavailable { url: Some(_) })));

        let entry = Entry::from_html(None, r#"<div class="e-content">   </div>"#);
        assert!(matches!(format(&entry, None, AddUrl::Auto), Err(CrossfeedError::ContentUnavailable { .. })));
    }

    #[test]
    fn test_url_is_only_added_when_known() {
        let entry = Entry::from_html(None, r#"<h1 class="p-name">Title</h1><div class="e-content">Body</div>"#);
        assert_eq!(format(&entry, Some(80), AddUrl::Always).unwrap().text, "Title");
    }

    #[test]
    fn test_card_description_is_preferred_for_articles() {
        let page = r#"<html><head>
            <meta property="og:description" content="A blurb that is a little bit too long for the post">
            <meta property="og:image" content="https://example.org/cover.png">
        </head><body></body></html>"#;
        let fetcher = StaticPageFetcher::default().with_page(TEST_URL, page);
        let options = FormatOptions::builder().limit(60).card_props(CardProps::open_graph()).build();

        let card =
            format_entry_with_fetcher(&longform_entry("Title"), &options, &mut NullUrlFlattener, &fetcher).unwrap();

        assert_eq!(card.provenance, CardSource::Card);
        assert_eq!(card.image.as_deref(), Some("https://example.org/cover.png"));
        assert_eq!(card.text, with_url("A blurb that is a little bit..."));
        assert!(card.text.chars().count() <= 60);
    }

    #[test]
    fn test_card_is_skipped_for_microposts() {
        let fetcher = StaticPageFetcher::default();
        let options = FormatOptions::builder().card_props(CardProps::open_graph()).build();

        let card =
            format_entry_with_fetcher(&micropost_entry("Hi"), &options, &mut NullUrlFlattener, &fetcher).unwrap();
        assert_eq!(card.text, "Hi");
    }

    #[test]
    fn test_fixed_width_urls_in_text() {
        let long_link = format!("https://example.org/{}", "x".repeat(100));
        let html = format!(
            r#"<div class="e-content"><p>Read <a href="{}">this page</a> now</p></div>"#,
            long_link
        );
        let entry = Entry::from_html(Some(TEST_URL), &html);
        let options = FormatOptions::builder().limit(50).build();

        let card = format_entry_with_fetcher(
            &entry,
            &options,
            &mut FixedWidthUrlFlattener::default(),
            &StaticPageFetcher::default(),
        )
        .unwrap();
        assert_eq!(card.text, format!("Read this page now\n{}", long_link));
    }

    #[test]
    fn test_mention_flattener_spans() {
        let html = concat!(
            r#"<div class="e-content"><p>Thanks <a href="https://bsky.app/profile/alice.bsky.social">Alice</a>"#,
            r#" for <a href="https://example.org/tips">the tips</a></p></div>"#,
        );
        let entry = Entry::from_html(Some(TEST_URL), html);
        let mut flattener = ProfileMentionFlattener::bluesky();
        let options = FormatOptions::builder().limit(256).build();

        let card = format_entry_with_fetcher(&entry, &options, &mut flattener, &StaticPageFetcher::default()).unwrap();

        assert_eq!(card.text, "Thanks @alice.bsky.social for the tips");
        assert_eq!(
            card.url_spans,
            vec![UrlSpan {
                start: 30,
                end: 38,
                url: "https://example.org/tips".to_string(),
                text: "the tips".to_string()
            }]
        );
        assert_eq!(&card.text[30..38], "the tips");
    }

    #[test]
    fn test_spans_from_the_discarded_pass_are_dropped() {
        let words = "word ".repeat(40);
        let html = format!(
            r#"<div class="e-content"><p>{}<a href="https://example.org/tail">tail link</a></p></div>"#,
            words
        );
        let entry = Entry::from_html(Some(TEST_URL), &html);
        let mut flattener = ProfileMentionFlattener::bluesky();
        let options = FormatOptions::builder().limit(100).add_url(AddUrl::Never).build();

        let card = format_entry_with_fetcher(&entry, &options, &mut flattener, &StaticPageFetcher::default()).unwrap();

        assert!(card.text.chars().count() <= 100);
        assert!(card.url_spans.iter().all(|span| span.matches(&card.text)));
    }

    #[rstest]
    #[case(
        r#"<p>Read <a href="https://example.org/tips">the tips</a> before the words é é é é é é é é é é é é é é</p>"#,
        vec!["the tips"]
    )]
    #[case(
        r#"<p>Hi <a href="https://example.org/x">a rather long link text that goes on and on here</a> é é é é é é</p>"#,
        vec![]
    )]
    #[case(
        concat!(
            r#"<ul><li>one two three <a href="https://example.org/l">link</a></li>"#,
            "<li>more words that will not fit in the post at all</li></ul>",
        ),
        vec![]
    )]
    fn test_spans_point_at_their_link_text(#[case] content: &str, #[case] expected: Vec<&str>) {
        let entry = Entry::from_html(Some(TEST_URL), &format!(r#"<div class="e-content">{}</div>"#, content));
        let mut flattener = ProfileMentionFlattener::bluesky();
        let options = FormatOptions::builder().limit(40).add_url(AddUrl::Never).build();

        let card = format_entry_with_fetcher(&entry, &options, &mut flattener, &StaticPageFetcher::default()).unwrap();

        assert!(card.text.chars().count() <= 40, "{:?}", card.text);
        let shown: Vec<&str> = card.url_spans.iter().map(|span| &card.text[span.start..span.end]).collect();
        assert_eq!(shown, expected);
    }

    #[test]
    fn test_auto_url_that_does_not_fit_a_micropost() {
        let entry = micropost_entry("A micropost that is longer than its limit");
        let result = format(&entry, Some(20), AddUrl::Auto);
        assert!(matches!(result, Err(CrossfeedError::LimitUnsatisfiable { limit: 20, reserved: 28 })));
    }

    #[test]
    fn test_last_mode_drops_urls_that_do_not_fit() {
        let entry = micropost_entry(r#"<p>Short <a href="http://example.org/long/url">text</a></p>"#);
        let options = FormatOptions::builder().limit(20).add_url(AddUrl::Never).url_mode(UrlMode::Last).build();

        let card =
            format_entry_with_fetcher(&entry, &options, &mut NullUrlFlattener, &StaticPageFetcher::default()).unwrap();
        assert_eq!(card.text, "Short text");
    }

    #[test]
    fn test_percent_signs_survive_reextraction() {
        let entry = micropost_entry("We are 100% sure that 50% of these words will be cut");
        let card = format(&entry, Some(40), AddUrl::Never).unwrap();
        assert_eq!(card.text, "We are 100% sure that 50% of these...");
    }

    #[test]
    fn test_url_alone_when_no_word_fits() {
        let entry = micropost_entry("Incomprehensibilities notwithstanding");
        let card = format(&entry, Some(30), AddUrl::Always).unwrap();
        assert_eq!(card.text, TEST_URL);
    }

    #[test]
    fn test_add_url_from_str() {
        assert_eq!("auto".parse::<AddUrl>().unwrap(), AddUrl::Auto);
        assert_eq!("Always".parse::<AddUrl>().unwrap(), AddUrl::Always);
        assert_eq!("false".parse::<AddUrl>().unwrap(), AddUrl::Never);
        assert!("sometimes".parse::<AddUrl>().is_err());
        assert_eq!(AddUrl::Never.to_string(), "never");
    }
}
