//! Card resolution: the text, and maybe image, an entry is posted with.

use serde::Serialize;

use super::flatten::UrlSpan;
use super::strip::{StripContext, strip_html};
use crate::Result;
use crate::entry::Entry;
use crate::fetch::PageFetcher;
use crate::parse::Document;

/// Classes looked up for an entry's best text, by priority.
const BEST_TEXT_CLASSES: [&str; 3] = ["p-title", "p-name", "e-content"];

/// Which `<meta>` tags of an entry's page describe it.
///
/// Tags are matched as `<meta {meta_attr}="{namespace}:description">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardProps {
    pub meta_attr: String,
    pub namespace: String,
}

impl CardProps {
    pub fn new(meta_attr: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { meta_attr: meta_attr.into(), namespace: namespace.into() }
    }

    /// Open Graph tags: `<meta property="og:description">`.
    pub fn open_graph() -> Self {
        Self::new("property", "og")
    }

    /// Twitter card tags: `<meta name="twitter:description">`.
    pub fn twitter() -> Self {
        Self::new("name", "twitter")
    }

    pub fn description_name(&self) -> String {
        format!("{}:description", self.namespace)
    }

    pub fn image_name(&self) -> String {
        format!("{}:image", self.namespace)
    }
}

/// Where a card's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSource {
    /// The description meta tag of the entry's page.
    Card,
    /// The entry's own markup.
    BestText,
}

/// A postable rendition of an entry for one silo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub provenance: CardSource,
    /// Links kept as plain text, for silos that annotate them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub url_spans: Vec<UrlSpan>,
    /// Canonical URL of the entry the card was made from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_url: Option<String>,
}

impl Card {
    fn new(entry: &Entry, text: String, image: Option<String>, provenance: CardSource) -> Self {
        Self { text, image, provenance, url_spans: Vec::new(), entry_url: entry.url().map(str::to_string) }
    }
}

/// Reads the entry's description from its published page.
///
/// Returns `Ok(None)` when the entry has no URL or the page has no
/// description. The description length is charged to `ctx` as is: it's
/// plain text, not markup.
pub fn get_card_info(
    entry: &Entry, props: &CardProps, fetcher: &dyn PageFetcher, ctx: &mut StripContext<'_>,
) -> Result<Option<Card>> {
    let Some(url) = entry.url() else {
        tracing::debug!("Entry has no URL, no card page to look at");
        return Ok(None);
    };

    tracing::debug!("Downloading entry page to check meta entries: {}", url);
    let html = fetcher.fetch_page(url)?;
    let doc = Document::parse(&html);

    let description = doc
        .head_meta_content(&props.meta_attr, &props.description_name())
        .filter(|desc| !desc.trim().is_empty());
    let image = doc.head_meta_content(&props.meta_attr, &props.image_name());

    Ok(description.map(|desc| {
        tracing::debug!("Found card info, description: {} (image: {:?})", desc, image);
        ctx.budget_mut().charge(desc.chars().count(), desc.len());
        Card::new(entry, desc, image, CardSource::Card)
    }))
}

/// Reduces the entry's title, name or content, whichever is found first.
///
/// Returns `Ok(None)` when the entry's markup has none of them.
pub fn get_best_text(entry: &Entry, ctx: &mut StripContext<'_>) -> Result<Option<String>> {
    let Some(element) = BEST_TEXT_CLASSES.iter().find_map(|class| entry.html_find(class)) else {
        return Ok(None);
    };
    strip_html(element.element_ref(), ctx).map(Some)
}

pub(crate) fn best_text_card(entry: &Entry, text: String) -> Card {
    Card::new(entry, text, None, CardSource::BestText)
}
