//! Escaped text templates with deferred URL placeholders.
//!
//! Reduced markup is built as a template: a literal `%` is written `%%` and a
//! URL whose final position isn't known yet is written `%(url:N)`, where `N`
//! indexes the URLs recorded during reduction. [`resolve`] turns a template
//! into final text in one pass.

use crate::{CrossfeedError, Result};

const PLACEHOLDER_OPEN: &str = "%(url:";

/// Escapes literal text so it can't be mistaken for a placeholder.
pub fn escape(text: &str) -> String {
    text.replace('%', "%%")
}

/// Builds the placeholder token for the URL at `index`.
pub fn placeholder(index: usize) -> String {
    format!("{}{})", PLACEHOLDER_OPEN, index)
}

/// A template piece: either visible text or a reference to a deferred URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Percent,
    Url(usize),
}

fn pieces(template: &str) -> Result<Vec<Piece<'_>>> {
    let mut out = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        if pos > 0 {
            out.push(Piece::Literal(&rest[..pos]));
        }
        let tail = &rest[pos..];
        if tail.starts_with("%%") {
            out.push(Piece::Percent);
            rest = &tail[2..];
        } else if let Some(after) = tail.strip_prefix(PLACEHOLDER_OPEN)
            && let Some(close) = after.find(')')
            && let Ok(index) = after[..close].parse::<usize>()
        {
            out.push(Piece::Url(index));
            rest = &after[close + 1..];
        } else {
            return Err(CrossfeedError::PlaceholderMismatch(format!(
                "stray '%' in template near: {}",
                tail.chars().take(16).collect::<String>()
            )));
        }
    }
    if !rest.is_empty() {
        out.push(Piece::Literal(rest));
    }

    Ok(out)
}

/// Visible length of a template in characters: `%%` counts as one and
/// placeholders count as nothing.
pub fn visible_len(template: &str) -> usize {
    measure(template, |s| s.chars().count())
}

/// Visible length of a template in UTF-8 bytes.
pub fn visible_byte_len(template: &str) -> usize {
    measure(template, str::len)
}

fn measure(template: &str, len: impl Fn(&str) -> usize) -> usize {
    // A malformed template is measured as plain text; `resolve` rejects it.
    let Ok(pieces) = pieces(template) else {
        return len(template);
    };
    pieces
        .iter()
        .map(|piece| match piece {
            Piece::Literal(text) => len(text),
            Piece::Percent => 1,
            Piece::Url(_) => 0,
        })
        .sum()
}

/// Resolves a template against the replacement text of each recorded URL.
///
/// When `strict` is set every placeholder index must appear exactly once.
/// Otherwise placeholders may be missing, which happens when shortening
/// dropped the words they were attached to. Unknown or repeated indices are
/// always an error.
pub fn resolve(template: &str, replacements: &[String], strict: bool) -> Result<String> {
    let mut seen = vec![false; replacements.len()];
    let mut out = String::with_capacity(template.len());

    for piece in pieces(template)? {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Percent => out.push('%'),
            Piece::Url(index) => {
                let Some(replacement) = replacements.get(index) else {
                    return Err(CrossfeedError::PlaceholderMismatch(format!(
                        "placeholder {} but only {} URLs recorded",
                        index,
                        replacements.len()
                    )));
                };
                if seen[index] {
                    return Err(CrossfeedError::PlaceholderMismatch(format!(
                        "placeholder {} appears twice",
                        index
                    )));
                }
                seen[index] = true;
                out.push_str(replacement);
            }
        }
    }

    if strict && let Some(missing) = seen.iter().position(|s| !s) {
        return Err(CrossfeedError::PlaceholderMismatch(format!(
            "placeholder {} never emitted",
            missing
        )));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_and_resolve_percent() {
        let template = escape("100% sure, 50%% off");
        assert_eq!(template, "100%% sure, 50%%%% off");
        assert_eq!(resolve(&template, &[], true).unwrap(), "100% sure, 50%% off");
    }

    #[test]
    fn test_resolve_placeholders_in_order() {
        let template = format!("one{} two{}", placeholder(0), placeholder(1));
        let urls = vec![" http://a".to_string(), " http://b".to_string()];
        assert_eq!(resolve(&template, &urls, true).unwrap(), "one http://a two http://b");
    }

    #[test]
    fn test_entry_text_is_not_a_placeholder() {
        let template = escape("literal %(url:0) text");
        assert_eq!(resolve(&template, &[], true).unwrap(), "literal %(url:0) text");
    }

    #[test]
    fn test_escaped_marker_lookalike_is_visible() {
        let template = escape("%(url:0)");
        assert_eq!(visible_len(&template), 8);
    }

    #[test]
    fn test_visible_lengths() {
        let template = format!("{}é{}", escape("5%"), placeholder(12));
        assert_eq!(visible_len(&template), 3);
        assert_eq!(visible_byte_len(&template), 4);
    }

    #[test]
    fn test_missing_placeholder_is_strict_error() {
        let urls = vec!["x".to_string()];
        assert!(matches!(
            resolve("no markers", &urls, true),
            Err(CrossfeedError::PlaceholderMismatch(_))
        ));
        assert_eq!(resolve("no markers", &urls, false).unwrap(), "no markers");
    }

    #[test]
    fn test_unknown_or_repeated_placeholder_is_error() {
        let urls = vec!["x".to_string()];
        let unknown = placeholder(3);
        assert!(resolve(&unknown, &urls, false).is_err());

        let twice = format!("{}{}", placeholder(0), placeholder(0));
        assert!(resolve(&twice, &urls, false).is_err());
    }

    #[test]
    fn test_stray_percent_is_error() {
        assert!(matches!(
            resolve("50% off", &[], false),
            Err(CrossfeedError::PlaceholderMismatch(_))
        ));
    }
}
