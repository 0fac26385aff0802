//! Caller-supplied options for a single fetch.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// The number of leading path components stripped from archives by default.
pub const DEFAULT_STRIP: u32 = 1;

/// An extracted file or directory, as seen by an [`EntryFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// The path relative to the root of the extracted tree.
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Decides which extracted entries end up in the destination. Return `true` to keep an entry.
#[derive(Clone)]
pub struct EntryFilter(Arc<dyn Fn(&FileEntry) -> bool + Send + Sync>);

impl EntryFilter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&FileEntry) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn includes(&self, entry: &FileEntry) -> bool {
        (self.0)(entry)
    }
}

impl std::fmt::Debug for EntryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EntryFilter(..)")
    }
}

/// Options for [`fetch_repository`](crate::fetch_repository).
///
/// Everything except the filter can be read from TOML or JSON:
///
/// ```rust
/// use fetch_repo::DownloadConfiguration;
///
/// let config: DownloadConfiguration = toml::from_str(r#"
///     strip = 0
///     headers = { authorization = "token abc" }
/// "#)?;
/// assert_eq!(config.strip(), 0);
/// assert!(!config.clone);
/// # Ok::<(), toml::de::Error>(())
/// ```
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfiguration {
    /// Use `git clone` instead of downloading an archive.
    pub clone: bool,
    /// Extra headers for the archive request.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Force (`true`) or forbid (`false`) a shallow clone. When unset only `master` and `main`
    /// are cloned shallowly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shallow: Option<bool>,
    /// Leading path components to strip from the archive. Defaults to [`DEFAULT_STRIP`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip: Option<u32>,
    /// Only used when downloading an archive.
    #[serde(skip)]
    pub filter: Option<EntryFilter>,
}

impl DownloadConfiguration {
    pub fn with_clone(mut self, clone: bool) -> Self {
        self.clone = clone;
        self
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_shallow(mut self, shallow: bool) -> Self {
        self.shallow = Some(shallow);
        self
    }

    pub fn with_strip(mut self, strip: u32) -> Self {
        self.strip = Some(strip);
        self
    }

    pub fn with_filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&FileEntry) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(EntryFilter::new(predicate));
        self
    }

    /// The effective strip count.
    pub fn strip(&self) -> u32 {
        self.strip.unwrap_or(DEFAULT_STRIP)
    }

    /// Whether a clone of `checkout` should be shallow.
    pub fn is_shallow_for(&self, checkout: &str) -> bool {
        self.shallow
            .unwrap_or_else(|| crate::descriptor::is_default_branch(checkout))
    }
}
