pub mod cache;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod parse;
pub mod silo;

pub use cache::{FileCache, MemoryCache, PostCache};
pub use entry::{Entry, EntryBuilder, MediaItem, media_urls};
pub use error::{CrossfeedError, Result};
#[cfg(feature = "fetch")]
pub use fetch::{HttpPageFetcher, fetch_url};
pub use fetch::{FetchConfig, PageFetcher, StaticPageFetcher};
pub use fetch::{fetch_file, fetch_stdin};
#[cfg(feature = "fetch")]
pub use formatters::format_entry;
pub use formatters::{AddUrl, FormatOptions, FormatOptionsBuilder, format_entry_with_fetcher};
pub use formatters::{Card, CardProps, CardSource, card_to_json};
pub use formatters::{
    FixedWidthUrlFlattener, NullUrlFlattener, ProfileMentionFlattener, UrlFlattener, UrlSpan,
};
pub use formatters::{StripContext, TextBudget, UrlMode, strip_html, strip_html_str};
pub use parse::Document;
pub use silo::SiloProfile;
