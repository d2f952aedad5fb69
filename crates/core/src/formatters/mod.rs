pub mod card;
pub mod context;
pub mod flatten;
pub mod json;
pub mod post;
pub mod strip;
pub mod template;

pub use card::{Card, CardProps, CardSource, get_best_text, get_card_info};
pub use context::{ELLIPSIS, TextBudget, UrlMode, shorten, shorten_plain};
pub use flatten::{
    BLUESKY_HOST, FixedWidthUrlFlattener, NullUrlFlattener, ProfileMentionFlattener, SHORT_URL_WIDTH, UrlFlattener,
    UrlSpan,
};
pub use json::{JsonOutput, card_to_json};
#[cfg(feature = "fetch")]
pub use post::format_entry;
pub use post::{AddUrl, FormatOptions, FormatOptionsBuilder, format_entry_with_fetcher};
pub use strip::{StripContext, strip_html, strip_html_str};
