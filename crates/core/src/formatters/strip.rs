//! HTML to plain text reduction.
//!
//! The reducer walks an element's children and builds a template (see
//! [`template`](super::template)) in which links whose URL can't be placed
//! yet leave a placeholder. [`strip_html`] then resolves the placeholders
//! according to the [`UrlMode`] and accounts for the URLs it adds.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};

use super::context::{TextBudget, UrlMode};
use super::flatten::UrlFlattener;
use super::template;
use crate::Result;
use crate::parse::Document;

/// Tags inside which whitespace-only text is meaningful.
const WHITESPACE_TAGS: [&str; 7] = ["h1", "h2", "h3", "h4", "h5", "h6", "p"];

/// A URL found while reducing markup.
#[derive(Debug, Clone)]
struct DeferredUrl {
    url: String,
    /// The link showed nothing but its URL, so no space goes before it.
    no_space: bool,
}

/// State for one reduction pass.
///
/// A context can't be reused: a pass with another limit needs a new one.
pub struct StripContext<'f> {
    url_mode: UrlMode,
    urls: Vec<DeferredUrl>,
    flattener: &'f mut dyn UrlFlattener,
    budget: TextBudget,
}

impl<'f> StripContext<'f> {
    pub fn new(url_mode: UrlMode, flattener: &'f mut dyn UrlFlattener, limit: Option<usize>) -> Self {
        Self { url_mode, urls: Vec::new(), flattener, budget: TextBudget::new(limit) }
    }

    pub fn budget(&self) -> &TextBudget {
        &self.budget
    }

    pub fn budget_mut(&mut self) -> &mut TextBudget {
        &mut self.budget
    }

    /// URLs found so far, in order of appearance.
    pub fn urls(&self) -> Vec<&str> {
        self.urls.iter().map(|u| u.url.as_str()).collect()
    }

    fn defer_url(&mut self, url: &str, no_space: bool) -> String {
        let marker = template::placeholder(self.urls.len());
        self.urls.push(DeferredUrl { url: url.to_string(), no_space });
        marker
    }

    /// Characters the deferred URLs add once placed, separators included.
    fn deferred_url_width(&self) -> usize {
        self.urls
            .iter()
            .map(|u| {
                let sep = match self.url_mode {
                    UrlMode::Inline => usize::from(!u.no_space),
                    _ => 1,
                };
                self.flattener.measure_url(&u.url) + sep
            })
            .sum()
    }
}

/// Reduces an HTML string to plain text.
///
/// # Example
///
/// ```rust
/// use crossfeed_core::{NullUrlFlattener, StripContext, UrlMode, strip_html_str};
///
/// let mut flattener = NullUrlFlattener;
/// let mut ctx = StripContext::new(UrlMode::Inline, &mut flattener, None);
/// let text = strip_html_str(r#"<p>See <a href="http://example.org/x">this</a></p>"#, &mut ctx).unwrap();
/// assert_eq!(text, "See this http://example.org/x");
/// ```
pub fn strip_html_str(html: &str, ctx: &mut StripContext<'_>) -> Result<String> {
    let doc = Document::parse_fragment(html);
    strip_html(doc.root().element_ref(), ctx)
}

/// Reduces the children of `root` to plain text and places their URLs.
pub fn strip_html(root: ElementRef<'_>, ctx: &mut StripContext<'_>) -> Result<String> {
    let mut out = String::new();
    for child in root.children() {
        out.push_str(&reduce_node(child, ctx));
    }
    place_urls(&out, ctx)
}

fn place_urls(reduced: &str, ctx: &mut StripContext<'_>) -> Result<String> {
    let url_width = if ctx.url_mode == UrlMode::Erase { 0 } else { ctx.deferred_url_width() };
    if !ctx.urls.is_empty() && !ctx.budget.limit_reached() && ctx.budget.would_exceed(url_width) {
        tracing::debug!("No room left for {} URL(s), dropping them", ctx.urls.len());
        ctx.budget.mark_limit_reached();
    }

    let limit_reached = ctx.budget.limit_reached();
    let inline = !limit_reached && ctx.url_mode == UrlMode::Inline;
    let replacements: Vec<String> = ctx
        .urls
        .iter()
        .map(|u| match (inline, u.no_space) {
            (false, _) => String::new(),
            (true, true) => u.url.clone(),
            (true, false) => format!(" {}", u.url),
        })
        .collect();

    // Shortening can drop words along with the placeholders glued to them.
    let mut text = template::resolve(reduced, &replacements, !limit_reached)?;
    if limit_reached {
        return Ok(text);
    }

    let urls = ctx.urls();
    if !urls.is_empty() {
        match ctx.url_mode {
            UrlMode::Last => {
                if text.chars().last().is_some_and(|c| !c.is_whitespace()) {
                    text.push(' ');
                }
                text.push_str(&urls.join(" "));
            }
            UrlMode::BottomList => {
                if text.chars().last().is_some_and(char::is_whitespace) {
                    text.pop();
                }
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&urls.join("\n"));
            }
            UrlMode::Inline | UrlMode::Erase => {}
        }
    }

    ctx.budget.charge(url_width, url_width);
    Ok(text)
}

fn reduce_node(node: NodeRef<'_, Node>, ctx: &mut StripContext<'_>) -> String {
    match node.value() {
        Node::Text(text) => reduce_text(node, text, ctx),
        Node::Element(_) => ElementRef::wrap(node).map(|el| reduce_element(el, ctx)).unwrap_or_default(),
        _ => String::new(),
    }
}

fn reduce_children(element: ElementRef<'_>, ctx: &mut StripContext<'_>) -> String {
    let mut out = String::new();
    for child in element.children() {
        out.push_str(&reduce_node(child, ctx));
    }
    out
}

fn reduce_text(node: NodeRef<'_, Node>, text: &str, ctx: &mut StripContext<'_>) -> String {
    // Whitespace between tags is markup indentation unless it sits in a
    // paragraph or heading.
    let whitespace_only = !text.is_empty() && text.chars().all(char::is_whitespace);
    if whitespace_only && !inside_whitespace_tag(node) {
        return String::new();
    }
    ctx.budget.process_text(&template::escape(text), true)
}

fn inside_whitespace_tag(node: NodeRef<'_, Node>) -> bool {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| WHITESPACE_TAGS.contains(&el.value().name()))
}

fn reduce_element(element: ElementRef<'_>, ctx: &mut StripContext<'_>) -> String {
    match element.value().name() {
        "a" => reduce_link(element, ctx),
        "ol" => reduce_list(element, ctx, true),
        "ul" => reduce_list(element, ctx, false),
        "p" => reduce_paragraph(element, ctx),
        _ => reduce_children(element, ctx),
    }
}

/// Text of a link made of a single text run, looking through lone wrapping
/// elements like `<em>`. An empty link counts as an empty run.
fn single_text_run(element: ElementRef<'_>) -> Option<String> {
    let mut children = element.children();
    let Some(only) = children.next() else {
        return Some(String::new());
    };
    if children.next().is_some() {
        return None;
    }
    match only.value() {
        Node::Text(text) => Some(text.to_string()),
        Node::Element(_) => ElementRef::wrap(only).and_then(single_text_run),
        _ => None,
    }
}

fn reduce_link(element: ElementRef<'_>, ctx: &mut StripContext<'_>) -> String {
    let Some(href) = element.value().attr("href") else {
        tracing::debug!("Link without href, keeping its text only");
        return reduce_children(element, ctx);
    };

    if let Some(text) = single_text_run(element) {
        let before = ctx.budget.position();
        let start = ctx.budget.byte_position();
        if let Some(flat) = ctx.flattener.replace_href(&text, href, &mut ctx.budget) {
            let flat = template::escape(&flat);
            if ctx.budget.position() == before {
                let kept = ctx.budget.process_text(&flat, false);
                if kept.is_empty() {
                    ctx.flattener.discard_spans_from(start);
                }
                return kept;
            }
            return flat;
        }

        if href.contains(text.as_str()) {
            if ctx.url_mode == UrlMode::Erase {
                return ctx.budget.process_text(&template::escape(&text), false);
            }
            // Measured with the other URLs once they're placed.
            return ctx.defer_url(href, true);
        }
    }

    let mut out = reduce_children(element, ctx);
    out.push_str(&ctx.defer_url(href, false));
    out
}

fn reduce_list(element: ElementRef<'_>, ctx: &mut StripContext<'_>, ordered: bool) -> String {
    let start = ctx.budget.byte_position();
    let mark = ctx.budget.begin_deferred();
    let mut out = String::new();

    let items = element.children().filter_map(ElementRef::wrap).filter(|el| el.value().name() == "li");
    for (index, item) in items.enumerate() {
        let bullet = if ordered { format!("{}. ", index + 1) } else { "- ".to_string() };
        ctx.budget.charge(bullet.len(), bullet.len());
        out.push_str(&bullet);
        out.push_str(&reduce_children(item, ctx));
        ctx.budget.charge(1, 1);
        out.push('\n');
    }

    ctx.budget.end_deferred(mark);
    let text = ctx.budget.process_text(&out, true);
    // Shortening collapses whitespace, so offsets inside the list move.
    if text != out {
        ctx.flattener.discard_spans_from(start);
    }
    text
}

fn reduce_paragraph(element: ElementRef<'_>, ctx: &mut StripContext<'_>) -> String {
    let mut out = String::new();
    if ctx.budget.position() > 0 {
        if ctx.budget.would_exceed(1) {
            ctx.budget.mark_limit_reached();
        } else {
            ctx.budget.charge(1, 1);
            out.push('\n');
        }
    }
    out.push_str(&reduce_children(element, ctx));
    out
}
