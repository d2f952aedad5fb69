//! Built-in silo profiles.
//!
//! A profile bundles the formatting defaults of one service. Callers start
//! from [`SiloProfile::options`] and override what they need, and take a
//! fresh flattener from [`SiloProfile::flattener`] for every entry.
//!
//! # Example
//!
//! ```rust
//! use crossfeed_core::SiloProfile;
//!
//! let silo: SiloProfile = "mastodon".parse().unwrap();
//! assert_eq!(silo.options().limit, Some(500));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::formatters::{
    CardProps, FixedWidthUrlFlattener, FormatOptions, NullUrlFlattener, ProfileMentionFlattener, SHORT_URL_WIDTH,
    UrlFlattener, UrlMode,
};
use crate::{CrossfeedError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiloProfile {
    /// Prints posts as they'd be sent. No limit.
    #[default]
    Print,
    Twitter,
    Mastodon,
    Bluesky,
    Facebook,
}

impl SiloProfile {
    pub const ALL: [SiloProfile; 5] =
        [SiloProfile::Print, SiloProfile::Twitter, SiloProfile::Mastodon, SiloProfile::Bluesky, SiloProfile::Facebook];

    pub fn name(self) -> &'static str {
        match self {
            SiloProfile::Print => "print",
            SiloProfile::Twitter => "twitter",
            SiloProfile::Mastodon => "mastodon",
            SiloProfile::Bluesky => "bluesky",
            SiloProfile::Facebook => "facebook",
        }
    }

    /// Maximum post length in characters, if the silo has one.
    pub fn limit(self) -> Option<usize> {
        match self {
            SiloProfile::Twitter => Some(280),
            SiloProfile::Mastodon => Some(500),
            SiloProfile::Bluesky => Some(256),
            SiloProfile::Print | SiloProfile::Facebook => None,
        }
    }

    pub fn options(self) -> FormatOptions {
        let mut options = FormatOptions { limit: self.limit(), ..Default::default() };
        match self {
            SiloProfile::Bluesky => options.url_mode = Some(UrlMode::Erase),
            SiloProfile::Facebook => options.card_props = Some(CardProps::open_graph()),
            SiloProfile::Print | SiloProfile::Twitter | SiloProfile::Mastodon => {}
        }
        options
    }

    /// A new flattener for one formatting call.
    pub fn flattener(self) -> Box<dyn UrlFlattener> {
        match self {
            SiloProfile::Twitter | SiloProfile::Mastodon => Box::new(FixedWidthUrlFlattener::new(SHORT_URL_WIDTH)),
            SiloProfile::Bluesky => Box::new(ProfileMentionFlattener::bluesky()),
            SiloProfile::Print | SiloProfile::Facebook => Box::new(NullUrlFlattener),
        }
    }
}

impl FromStr for SiloProfile {
    type Err = CrossfeedError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        SiloProfile::ALL
            .into_iter()
            .find(|silo| silo.name() == lower)
            .ok_or_else(|| CrossfeedError::ConfigError(format!("Unknown silo: {}", s)))
    }
}

impl fmt::Display for SiloProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::AddUrl;

    #[test]
    fn test_silo_from_str() {
        assert_eq!("Twitter".parse::<SiloProfile>().unwrap(), SiloProfile::Twitter);
        for silo in SiloProfile::ALL {
            assert_eq!(silo.to_string().parse::<SiloProfile>().unwrap(), silo);
        }
        assert!(matches!("myspace".parse::<SiloProfile>(), Err(CrossfeedError::ConfigError(_))));
    }

    #[test]
    fn test_silo_options() {
        let bluesky = SiloProfile::Bluesky.options();
        assert_eq!(bluesky.limit, Some(256));
        assert_eq!(bluesky.url_mode, Some(UrlMode::Erase));
        assert_eq!(bluesky.add_url, AddUrl::Auto);

        let facebook = SiloProfile::Facebook.options();
        assert_eq!(facebook.limit, None);
        assert_eq!(facebook.card_props, Some(CardProps::open_graph()));

        assert_eq!(SiloProfile::Print.options(), FormatOptions::default());
    }

    #[test]
    fn test_silo_flatteners() {
        assert_eq!(SiloProfile::Twitter.flattener().measure_url("http://a.b"), 23);
        assert_eq!(SiloProfile::Print.flattener().measure_url("http://a.b"), 10);
        assert!(SiloProfile::Bluesky.flattener().collects_spans());
        assert!(!SiloProfile::Mastodon.flattener().collects_spans());
    }
}
