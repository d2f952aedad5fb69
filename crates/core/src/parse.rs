//! HTML parsing and DOM lookup.
//!
//! This module provides the [`Document`] and [`Element`] types used to hold
//! entry markup and card pages, and to find elements by class name or CSS
//! selector.
//!
//! # Example
//!
//! ```rust
//! use crossfeed_core::parse::Document;
//!
//! let html = r#"<article class="h-entry"><h1 class="p-name">Title</h1></article>"#;
//!
//! let doc = Document::parse_fragment(html);
//! let name = doc.find_by_class("p-name").unwrap();
//! assert_eq!(name.text(), "Title");
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::{CrossfeedError, Result};

/// Represents a parsed HTML document or fragment.
///
/// # Example
///
/// ```rust
/// use crossfeed_core::parse::Document;
///
/// let html = r#"<html><head><meta name="description" content="Test"></head><body><p>Hello</p></body></html>"#;
/// let doc = Document::parse(html);
/// assert_eq!(doc.head_meta_content("name", "description"), Some("Test".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML page, such as the page a card is read from.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Parses a fragment of markup, such as a single feed entry.
    ///
    /// The fragment's top-level nodes become the children of the root element.
    pub fn parse_fragment(html: &str) -> Self {
        Self { html: Html::parse_fragment(html) }
    }

    /// Gets the root element of the document.
    pub fn root(&self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`CrossfeedError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use crossfeed_core::parse::Document;
    ///
    /// let doc = Document::parse(r#"<p class="content">First</p><p class="content">Second</p>"#);
    /// assert_eq!(doc.select("p.content").unwrap().len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Finds the first element, in document order, carrying the given class.
    pub fn find_by_class(&self, class: &str) -> Option<Element<'_>> {
        self.root().find_by_class(class)
    }

    /// Reads the `content` of the first `<meta>` in `<head>` whose `attr`
    /// attribute equals `value`, e.g. `meta[property="og:description"]`.
    pub fn head_meta_content(&self, attr: &str, value: &str) -> Option<String> {
        let head_selector = Selector::parse("head").ok()?;
        let Some(head) = self.html.select(&head_selector).next() else {
            tracing::warn!("Document has no <head>, can't look for meta {}={}", attr, value);
            return None;
        };

        let meta_selector = Selector::parse("meta").ok()?;
        head.select(&meta_selector)
            .find(|el| el.value().attr(attr) == Some(value))
            .and_then(|el| el.value().attr("content"))
            .map(|content| content.to_string())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| CrossfeedError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use crossfeed_core::parse::Document;
///
/// let doc = Document::parse_fragment(r#"<a href="https://example.com">Link text</a>"#);
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the underlying scraper element, for tree walks.
    pub fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }

    /// Gets the concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Whether the element's `class` attribute lists `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.element.value().classes().any(|c| c == class)
    }

    /// Finds the first descendant, in document order, carrying the given class.
    pub fn find_by_class(&self, class: &str) -> Option<Element<'a>> {
        self.element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
            .find(|el| el.has_class(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
            <meta property="og:description" content="A short blurb">
            <meta name="twitter:description" content="Another blurb">
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <meta property="og:image" content="https://example.org/body.png">
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_PAGE);
        assert_eq!(doc.root().find_by_class("content").map(|el| el.text()), Some("Paragraph 1".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_PAGE);
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_PAGE);
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(CrossfeedError::HtmlParseError(_))));
    }

    #[test]
    fn test_head_meta_content() {
        let doc = Document::parse(SAMPLE_PAGE);

        assert_eq!(
            doc.head_meta_content("property", "og:description"),
            Some("A short blurb".to_string())
        );
        assert_eq!(
            doc.head_meta_content("name", "twitter:description"),
            Some("Another blurb".to_string())
        );
        assert_eq!(doc.head_meta_content("name", "og:description"), None);
    }

    #[test]
    fn test_head_meta_ignores_body() {
        let doc = Document::parse(SAMPLE_PAGE);
        assert_eq!(doc.head_meta_content("property", "og:image"), None);
    }

    #[test]
    fn test_find_by_class_in_fragment() {
        let doc = Document::parse_fragment(
            r#"<div class="h-entry"><span class="p-name extra">Name</span><div class="e-content">Body</div></div>"#,
        );

        let name = doc.find_by_class("p-name").unwrap();
        assert_eq!(name.attr("class"), Some("p-name extra"));
        assert_eq!(name.text(), "Name");
        assert!(doc.find_by_class("p-title").is_none());
    }
}
