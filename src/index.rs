use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to read index {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("index {path} is not a valid name-to-url map: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write index {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Name-to-URL index of college detail pages.
///
/// Keys look like `"<lowercased name> (<slug>)"` so colleges sharing a display
/// name stay distinct. Both keys and urls are unique; entries are never
/// replaced once inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollegeIndex {
    entries: BTreeMap<String, String>,
    seen_urls: HashSet<String>,
}

impl CollegeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: BTreeMap<String, String>) -> Self {
        let seen_urls = entries.values().cloned().collect();
        Self { entries, seen_urls }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Insert a listing link. Returns the new key, or `None` when the url was
    /// already indexed or the name/href is blank.
    pub fn insert_link(&mut self, name: &str, href: &str) -> Option<String> {
        let name = name.trim();
        let href = href.trim();
        if name.is_empty() || href.is_empty() || self.seen_urls.contains(href) {
            return None;
        }

        let key = entry_key(name, href);
        self.seen_urls.insert(href.to_string());
        if self.entries.contains_key(&key) {
            debug!("Key {:?} already maps to another url, skipping {}", key, href);
            return None;
        }
        self.entries.insert(key.clone(), href.to_string());
        Some(key)
    }
}

/// Build the composite key: lowercased display name plus the url slug.
pub fn entry_key(name: &str, href: &str) -> String {
    format!("{} ({})", name.trim().to_lowercase(), url_slug(href))
}

/// Last non-empty path segment of a url, ignoring query and fragment.
pub fn url_slug(href: &str) -> &str {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Split a key into its display name and the parenthetical disambiguator.
pub fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once(" (") {
        Some((name, rest)) => {
            let alias = rest.strip_suffix(')').unwrap_or(rest);
            (name, Some(alias).filter(|a| !a.is_empty()))
        }
        None => (key, None),
    }
}

/// JSON file holding a [`CollegeIndex`].
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the index, or an empty one if the file does not exist yet.
    pub fn load(&self) -> Result<CollegeIndex, IndexError> {
        if !self.path.exists() {
            debug!("No index at {}, starting empty", self.path.display());
            return Ok(CollegeIndex::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| IndexError::Read {
            path: self.path.clone(),
            source,
        })?;
        let entries: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|source| IndexError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(CollegeIndex::from_map(entries))
    }

    /// Rewrite the whole file: serialize to a temp file beside it, then rename
    /// over the target so readers never observe a half-written index.
    pub fn save(&self, index: &CollegeIndex) -> Result<(), IndexError> {
        let write_err = |source| IndexError::Write {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(write_err)?;

        let encoded = serde_json::to_string_pretty(index.as_map()).map_err(|e| write_err(e.into()))?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(encoded.as_bytes()).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

// ── Tests ──
