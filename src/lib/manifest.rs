//! Repositories declared in a TOML manifest under `[package.metadata.fetch-repo]`.
//!
//! ```toml
//! [package.metadata.fetch-repo]
//! fixture = { repo = "flippidippi/download-git-repo-fixture" }
//! docs = { repo = "gitlab:group/docs#v2", strip = 0 }
//! "vendor::tool" = { repo = "owner/tool#main", clone = true }
//! ```
//!
//! Every key other than `repo` is a [`DownloadConfiguration`] option.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::DownloadConfiguration;
use crate::descriptor::{RepositoryDescriptor, parse};

const REPO_KEY: &str = "repo";

/// Errors encountered when parsing a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    /// The `package.metadata.fetch-repo` table was not found.
    #[error("required table 'package.metadata.fetch-repo' not found in string")]
    SourceTableNotFound,

    /// A toml value was expected to be a table.
    #[error("expected value '{name}' to be a toml table")]
    ValueNotTable { name: String },

    #[error("entry '{name}' has no 'repo' string")]
    MissingRepo { name: String },

    /// The `repo` string or one of the options is invalid.
    #[error("entry '{name}' is invalid")]
    InvalidEntry {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// One entry's directory would contain another's, e.g. `a` and `a::b`.
    #[error("entry '{inner}' would be fetched inside entry '{outer}'")]
    NestedEntries { outer: String, inner: String },

    /// A toml deserialisation error occurred.
    #[error(transparent)]
    TomlInvalid(#[from] toml::de::Error),
}

/// One repository in a manifest.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub repo: String,
    pub descriptor: RepositoryDescriptor,
    pub config: DownloadConfiguration,
}

impl ManifestEntry {
    /// Parse a single manifest value. The table must contain a `repo` string; the remaining
    /// keys are read as a [`DownloadConfiguration`].
    pub fn parse<S: ToString>(name: S, mut table: toml::Table) -> Result<Self, ManifestParseError> {
        let invalid = |source: Box<dyn std::error::Error + Send + Sync>| {
            ManifestParseError::InvalidEntry {
                name: name.to_string(),
                source,
            }
        };
        let repo = match table.remove(REPO_KEY) {
            Some(toml::Value::String(repo)) => repo,
            _ => {
                return Err(ManifestParseError::MissingRepo {
                    name: name.to_string(),
                });
            }
        };
        let descriptor = parse(&repo).map_err(|e| invalid(Box::new(e)))?;
        let config = toml::Value::Table(table)
            .try_into::<DownloadConfiguration>()
            .map_err(|e| invalid(Box::new(e)))?;
        Ok(Self {
            repo,
            descriptor,
            config,
        })
    }

    /// Convert an entry name into a partial path. Each `::`-separated component maps onto a
    /// subdirectory.
    pub fn as_path_component<S: AsRef<str>>(name: S) -> PathBuf {
        PathBuf::from_iter(name.as_ref().split("::"))
    }
}

/// The contents of the `package.metadata.fetch-repo` table, keyed (and ordered) by name.
pub type Manifest = BTreeMap<String, ManifestEntry>;

/// Parse a `package.metadata.fetch-repo` table into a [`Manifest`].
///
/// Every entry gets its own directory, so a name may not be a `::`-prefix of another name.
pub fn try_parse(table: &toml::Table) -> Result<Manifest, ManifestParseError> {
    let manifest = table
        .iter()
        .map(|(k, v)| match v.as_table() {
            Some(t) => ManifestEntry::parse(k, t.to_owned()).map(|e| (k.to_owned(), e)),
            None => Err(ManifestParseError::ValueNotTable { name: k.to_owned() }),
        })
        .collect::<Result<Manifest, _>>()?;
    check_not_nested(&manifest)?;
    Ok(manifest)
}

fn check_not_nested(manifest: &Manifest) -> Result<(), ManifestParseError> {
    for outer in manifest.keys() {
        let prefix = format!("{outer}::");
        if let Some((inner, _)) = manifest.range(prefix.clone()..).next()
            && inner.starts_with(&prefix)
        {
            return Err(ManifestParseError::NestedEntries {
                outer: outer.clone(),
                inner: inner.clone(),
            });
        }
    }
    Ok(())
}

/// Parse a TOML document containing the `package.metadata.fetch-repo` table.
pub fn try_parse_toml<S: AsRef<str>>(toml_str: S) -> Result<Manifest, ManifestParseError> {
    let table = toml_str.as_ref().parse::<toml::Table>()?;
    let entries = table
        .get("package")
        .and_then(|v| v.get("metadata"))
        .and_then(|v| v.get("fetch-repo"))
        .and_then(|v| v.as_table())
        .ok_or(ManifestParseError::SourceTableNotFound)?;
    try_parse(entries)
}

#[cfg(test)]
use ManifestParseError::*;

#[cfg(test)]
mod test_parsing_single_entry {
    use super::*;
    use crate::descriptor::Kind;

    #[test]
    fn repo_only() {
        let entry = ManifestEntry::parse(
            "fixture",
            toml::toml! {
                repo = "flippidippi/download-git-repo-fixture#my-branch"
            },
        )
        .unwrap();
        assert_eq!(entry.descriptor.kind(), Kind::GitHub);
        assert_eq!(entry.descriptor.checkout(), "my-branch");
        assert!(!entry.config.clone);
        assert_eq!(entry.config.strip(), 1);
    }

    #[test]
    fn options_are_read() {
        let entry = ManifestEntry::parse(
            "tool",
            toml::toml! {
                repo = "gitlab:owner/tool"
                clone = true
                shallow = false
                strip = 0
                headers = { authorization = "token abc" }
            },
        )
        .unwrap();
        assert!(entry.config.clone);
        assert_eq!(entry.config.shallow, Some(false));
        assert_eq!(entry.config.strip(), 0);
        assert_eq!(entry.config.headers["authorization"], "token abc");
    }

    #[test]
    fn missing_repo_fails() {
        let entry = ManifestEntry::parse("src", toml::toml! { clone = true });
        assert!(matches!(entry, Err(MissingRepo { name }) if name == "src"));
    }

    #[test]
    fn bad_repo_string_fails() {
        let entry = ManifestEntry::parse("src", toml::toml! { repo = "nonsense" });
        assert!(matches!(entry, Err(InvalidEntry { name, .. }) if name == "src"));
    }

    #[test]
    fn unknown_option_fails() {
        let entry = ManifestEntry::parse(
            "src",
            toml::toml! {
                repo = "owner/name"
                depth = 3
            },
        );
        assert!(matches!(entry, Err(InvalidEntry { name, .. }) if name == "src"));
    }

    #[test]
    fn nested_names_map_to_subdirectories() {
        assert_eq!(
            ManifestEntry::as_path_component("vendor::tool"),
            PathBuf::from("vendor").join("tool")
        );
    }
}
