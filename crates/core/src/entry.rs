//! Feed entries and their properties.
//!
//! An [`Entry`] is one item of a feed: an optional canonical URL, a set of
//! multi-valued properties and the entry's own markup. Entries are immutable
//! once built and are read by every silo the entry gets posted to.
//!
//! # Example
//!
//! ```rust
//! use crossfeed_core::Entry;
//!
//! let entry = Entry::from_html(
//!     Some("https://example.org/notes/1"),
//!     r#"<div class="h-entry"><p class="e-content">Just a quick note</p></div>"#,
//! );
//!
//! assert!(entry.is_micropost());
//! assert_eq!(entry.get_str("content-plain"), Some("Just a quick note"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse::{Document, Element};
use crate::{CrossfeedError, Result};

/// An attached photo or video: a bare URL, or a URL with alternative text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaItem {
    Url(String),
    Described {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
}

impl MediaItem {
    pub fn url(&self) -> &str {
        match self {
            MediaItem::Url(url) => url,
            MediaItem::Described { value, .. } => value,
        }
    }

    pub fn alt(&self) -> Option<&str> {
        match self {
            MediaItem::Url(_) => None,
            MediaItem::Described { alt, .. } => alt.as_deref(),
        }
    }
}

/// Strips the alternative text off media items, keeping their URLs in order.
pub fn media_urls(items: &[MediaItem]) -> Vec<&str> {
    items.iter().map(MediaItem::url).collect()
}

/// A feed entry.
#[derive(Debug, Clone)]
pub struct Entry {
    url: Option<String>,
    /// Every property holds a JSON array.
    properties: BTreeMap<String, Value>,
    document: Document,
    is_micropost: bool,
}

impl Entry {
    pub fn builder() -> EntryBuilder {
        EntryBuilder::default()
    }

    /// Builds an entry from its markup.
    ///
    /// `name` and `content-plain` are read from the text of the first
    /// `.p-name` and `.e-content` elements, `photo` from `.u-photo` images.
    /// When no URL is given, the first `.u-url` link is used.
    pub fn from_html(url: Option<&str>, html: &str) -> Self {
        let document = Document::parse_fragment(html);
        let mut builder = Entry::builder();

        let url = url
            .map(str::to_string)
            .or_else(|| document.find_by_class("u-url").and_then(|el| el.attr("href")).map(str::to_string));
        if let Some(url) = url {
            builder = builder.url(url);
        }

        for (class, property) in [("p-name", "name"), ("e-content", "content-plain")] {
            if let Some(el) = document.find_by_class(class) {
                let text = collapse_whitespace(&el.text());
                if !text.is_empty() {
                    builder = builder.property(property, text);
                }
            }
        }

        if let Ok(photos) = document.select("img.u-photo") {
            for photo in photos {
                let Some(src) = photo.attr("src") else { continue };
                let item = match photo.attr("alt").filter(|alt| !alt.is_empty()) {
                    Some(alt) => serde_json::json!({ "value": src, "alt": alt }),
                    None => Value::String(src.to_string()),
                };
                builder = builder.property("photo", item);
            }
        }

        builder.document(document).build()
    }

    /// Canonical URL of the entry.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Whether the entry is a short post with no title of its own.
    pub fn is_micropost(&self) -> bool {
        self.is_micropost
    }

    /// Gets a property, collapsing a one-element list to its only value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let values = self.properties.get(name)?;
        match values.as_array().map(Vec::as_slice) {
            Some([]) => None,
            Some([only]) => Some(only),
            _ => Some(values),
        }
    }

    /// Gets every value of a property, never collapsing.
    pub fn get_list(&self, name: &str) -> &[Value] {
        self.properties.get(name).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
    }

    /// Gets a single-valued property as a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Finds the first element of the entry's markup carrying `class`.
    pub fn html_find(&self, class: &str) -> Option<Element<'_>> {
        self.document.find_by_class(class)
    }

    /// Reads the `photo` property as media items.
    ///
    /// # Errors
    ///
    /// Returns [`CrossfeedError::InvalidMedia`] for a value that is neither a
    /// URL nor a `{value, alt}` object.
    pub fn media(&self) -> Result<Vec<MediaItem>> {
        self.get_list("photo")
            .iter()
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|_| CrossfeedError::InvalidMedia(value.to_string()))
            })
            .collect()
    }
}

/// Builder for [`Entry`].
#[derive(Debug, Default)]
pub struct EntryBuilder {
    url: Option<String>,
    properties: BTreeMap<String, Vec<Value>>,
    document: Option<Document>,
}

impl EntryBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a value to a property. Arrays add each of their items.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let values = self.properties.entry(name.into()).or_default();
        match value.into() {
            Value::Array(items) => values.extend(items),
            other => values.push(other),
        }
        self
    }

    /// Sets the entry markup.
    pub fn html(self, html: &str) -> Self {
        self.document(Document::parse_fragment(html))
    }

    fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn build(self) -> Entry {
        let is_micropost = detect_micropost(
            first_str(&self.properties, "name"),
            first_str(&self.properties, "content-plain"),
        );
        Entry {
            url: self.url,
            properties: self.properties.into_iter().map(|(name, values)| (name, Value::Array(values))).collect(),
            document: self.document.unwrap_or_else(|| Document::parse_fragment("")),
            is_micropost,
        }
    }
}

fn first_str<'a>(properties: &'a BTreeMap<String, Vec<Value>>, name: &str) -> Option<&'a str> {
    properties.get(name)?.first()?.as_str().filter(|s| !s.is_empty())
}

/// A post is micro when it has only one of a name and a body, or when one of
/// them starts the other, which is how feeds imply a name from the content.
fn detect_micropost(name: Option<&str>, content: Option<&str>) -> bool {
    match (name, content) {
        (Some(_), None) | (None, Some(_)) => true,
        (Some(name), Some(content)) => name.starts_with(content) || content.starts_with(name),
        (None, None) => false,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
