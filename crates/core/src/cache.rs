//! Records of entries already posted, keyed by silo and entry URL.
//!
//! A feed is usually polled again and again, so callers check
//! [`PostCache::was_posted`] before formatting an entry for a silo and call
//! [`PostCache::add_post`] once the post went out.
//!
//! # Example
//!
//! ```rust
//! use crossfeed_core::{MemoryCache, PostCache};
//!
//! let mut cache = MemoryCache::new();
//! cache.add_post("twitter", "https://example.org/a").unwrap();
//!
//! assert!(cache.was_posted("twitter", "https://example.org/a"));
//! assert!(!cache.was_posted("mastodon", "https://example.org/a"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CrossfeedError, Result};

/// Where posted entries are remembered.
pub trait PostCache {
    fn was_posted(&self, silo: &str, entry_url: &str) -> bool;

    /// Remembers that `entry_url` was posted to `silo`.
    fn add_post(&mut self, silo: &str, entry_url: &str) -> Result<()>;
}

/// Posted entries held in memory, lost when dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryCache {
    posted: BTreeMap<String, BTreeSet<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (silo, entry) pairs recorded.
    pub fn len(&self) -> usize {
        self.posted.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records a post, returning whether it wasn't known yet.
    fn insert(&mut self, silo: &str, entry_url: &str) -> bool {
        self.posted.entry(silo.to_string()).or_default().insert(entry_url.to_string())
    }
}

impl PostCache for MemoryCache {
    fn was_posted(&self, silo: &str, entry_url: &str) -> bool {
        self.posted.get(silo).is_some_and(|urls| urls.contains(entry_url))
    }

    fn add_post(&mut self, silo: &str, entry_url: &str) -> Result<()> {
        self.insert(silo, entry_url);
        Ok(())
    }
}

/// A [`MemoryCache`] kept in a JSON file, mapping silo names to the entry
/// URLs posted there.
///
/// The file is rewritten on every new post.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
    posts: MemoryCache,
}

impl FileCache {
    /// Loads the cache at `path`. A missing file is an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`CrossfeedError::CacheError`] if the file isn't a valid
    /// cache, or an I/O error if it can't be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            tracing::debug!("No post cache at {}, starting empty", path.display());
            return Ok(Self { path, posts: MemoryCache::new() });
        }

        let content = fs::read_to_string(&path)?;
        let posts = serde_json::from_str(&content)
            .map_err(|e| CrossfeedError::CacheError { path: path.clone(), message: e.to_string() })?;
        Ok(Self { path, posts })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn posts(&self) -> &MemoryCache {
        &self.posts
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.posts)?)?;
        Ok(())
    }
}

impl PostCache for FileCache {
    fn was_posted(&self, silo: &str, entry_url: &str) -> bool {
        self.posts.was_posted(silo, entry_url)
    }

    fn add_post(&mut self, silo: &str, entry_url: &str) -> Result<()> {
        if self.posts.insert(silo, entry_url) {
            tracing::debug!("Recording {} as posted to {}", entry_url, silo);
            self.save()?;
        }
        Ok(())
    }
}
