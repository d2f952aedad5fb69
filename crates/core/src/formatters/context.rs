//! Length accounting for text produced while reducing markup.

use std::fmt;
use std::str::FromStr;

use super::template;
use crate::CrossfeedError;

/// Marker appended to text shortened at a word boundary.
pub const ELLIPSIS: &str = "...";

/// Where the URLs of hyperlinks end up in the reduced text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlMode {
    /// Right after the link text, separated by a space.
    Inline,
    /// All together at the end of the text, separated by spaces.
    Last,
    /// At the end of the text, one URL per line.
    #[default]
    BottomList,
    /// Dropped from the text, for silos that carry links as metadata.
    Erase,
}

impl FromStr for UrlMode {
    type Err = CrossfeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(UrlMode::Inline),
            "last" => Ok(UrlMode::Last),
            "bottom-list" | "bottom" => Ok(UrlMode::BottomList),
            "erase" | "none" => Ok(UrlMode::Erase),
            _ => Err(CrossfeedError::ConfigError(format!("Unknown URL mode: {}", s))),
        }
    }
}

impl fmt::Display for UrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UrlMode::Inline => "inline",
            UrlMode::Last => "last",
            UrlMode::BottomList => "bottom-list",
            UrlMode::Erase => "erase",
        })
    }
}

/// Running character and byte counters for one reduction pass.
///
/// Counters only ever grow. Redoing a pass with a different limit takes a
/// fresh budget.
///
/// While a deferral is open (see [`TextBudget::begin_deferred`]) text is
/// tracked on the side instead of being charged, so that a composite unit
/// such as a list can be charged, and shortened, as a whole afterwards.
#[derive(Debug, Clone, Default)]
pub struct TextBudget {
    limit: Option<usize>,
    text_length: usize,
    byte_length: usize,
    limit_reached: bool,
    deferred_depth: usize,
    deferred: (usize, usize),
}

/// Deferred counters at the time a deferral was opened.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct DeferMark((usize, usize));

impl TextBudget {
    /// Creates a budget, where `None` or `Some(0)` means no limit.
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit: limit.filter(|l| *l > 0), ..Default::default() }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Accumulated length in characters, including measured URL widths.
    pub fn text_length(&self) -> usize {
        self.text_length
    }

    /// Accumulated length in UTF-8 bytes.
    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    /// Current output position in characters, counting deferred text.
    pub fn position(&self) -> usize {
        self.text_length + self.deferred.0
    }

    /// Current output position in UTF-8 bytes, counting deferred text.
    pub fn byte_position(&self) -> usize {
        self.byte_length + self.deferred.1
    }

    /// Whether adding `extra` characters would go over the limit.
    pub fn would_exceed(&self, extra: usize) -> bool {
        self.limit.is_some_and(|limit| self.text_length + extra > limit)
    }

    /// Starts tracking text on the side instead of charging it.
    pub fn begin_deferred(&mut self) -> DeferMark {
        self.deferred_depth += 1;
        DeferMark(self.deferred)
    }

    /// Ends a deferral, dropping whatever was tracked since `mark`.
    pub fn end_deferred(&mut self, mark: DeferMark) {
        self.deferred_depth = self.deferred_depth.saturating_sub(1);
        self.deferred = mark.0;
    }

    /// Marks the limit as reached without adding text.
    pub fn mark_limit_reached(&mut self) {
        self.limit_reached = true;
    }

    /// Adds lengths that don't come from template text, such as the width
    /// a silo will count for a URL.
    pub fn charge(&mut self, chars: usize, bytes: usize) {
        if self.deferred_depth > 0 {
            self.deferred.0 += chars;
            self.deferred.1 += bytes;
        } else {
            self.text_length += chars;
            self.byte_length += bytes;
        }
    }

    /// Accounts for a piece of template text and returns what to emit.
    ///
    /// Text that fits is returned unchanged. Text that doesn't is shortened
    /// at a word boundary when `allow_shorten` is set, or dropped otherwise.
    /// Either way the limit is then marked as reached.
    pub fn process_text(&mut self, text: &str, allow_shorten: bool) -> String {
        let added = template::visible_len(text);
        if self.deferred_depth > 0 || !self.would_exceed(added) {
            self.charge(added, template::visible_byte_len(text));
            return text.to_string();
        }

        self.limit_reached = true;
        if !allow_shorten {
            return String::new();
        }

        let remaining = self.limit.map_or(0, |limit| limit.saturating_sub(self.text_length));
        let short = shorten(text, remaining, template::visible_len);
        self.charge(template::visible_len(&short), template::visible_byte_len(&short));
        short
    }
}

/// Shortens `text` to at most `width` measured characters.
///
/// Whitespace is collapsed, whole words are kept for as long as they fit
/// alongside the [`ELLIPSIS`], and no word is ever split. Text that fits once
/// collapsed is returned without an ellipsis. When not even the ellipsis fits,
/// the result is empty.
pub fn shorten(text: &str, width: usize, measure: impl Fn(&str) -> usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if measure(&collapsed) <= width {
        return collapsed;
    }

    let ellipsis_len = ELLIPSIS.chars().count();
    if width < ellipsis_len {
        return String::new();
    }

    let mut out = String::new();
    let mut out_len = 0;
    for word in words {
        let word_len = measure(word);
        let sep = usize::from(!out.is_empty());
        if out_len + sep + word_len + ellipsis_len > width {
            break;
        }
        if sep == 1 {
            out.push(' ');
        }
        out.push_str(word);
        out_len += sep + word_len;
    }
    out.push_str(ELLIPSIS);
    out
}

/// Shortens plain text, measuring characters.
pub fn shorten_plain(text: &str, width: usize) -> String {
    shorten(text, width, |s| s.chars().count())
}
