#![allow(rustdoc::redundant_explicit_links)]
//! Fetch a Git repository from a short specification and place its files in a local directory.
//!
//! A repository is named by a compact string such as `owner/name`, `gitlab:owner/name#v2` or
//! `direct:https://example.com/archive.zip`. It can be fetched either by downloading the
//! provider's zip archive over HTTP (the default) or by running `git clone` (requires `git` to be
//! installed and available on `PATH`). Either way the destination ends up with the repository's
//! files and no version-control metadata.
//!
//! # Specifications
//!
//! ```text
//! [github:|gitlab:|bitbucket:][origin:]owner/name[#checkout]
//! direct:url[#checkout]
//! ```
//!
//! - The provider defaults to `github`, the checkout to `master`.
//! - `origin` overrides the provider's default host, e.g. `gitlab:custom.com:owner/name`.
//! - Anything else starting with `http:`, `https:` or `git:` is treated as a direct URL.
//!
//! # Usage
//!
//! Parse a specification and see where it would be fetched from:
//!
//! ```rust
//! use fetch_repo::{parse, resolve_url, Mode};
//!
//! let repo = parse("gitlab:owner/name#v2")?;
//! assert_eq!(repo.checkout(), "v2");
//! assert_eq!(
//!     resolve_url(&repo, Mode::Archive),
//!     "https://gitlab.com/owner/name/repository/archive.zip?ref=v2"
//! );
//! # Ok::<(), fetch_repo::Error>(())
//! ```
//!
//! Fetch it:
//!
//! ```no_run
//! use fetch_repo::{fetch_repository, DownloadConfiguration};
//!
//! let config = DownloadConfiguration::default()
//!     .with_strip(1)
//!     .with_filter(|entry| entry.is_dir || entry.path.extension().is_some_and(|e| e == "rs"));
//! fetch_repository("owner/name#v2", "vendor/name", &config)?;
//! # Ok::<(), fetch_repo::Error>(())
//! ```
//!
//! # Manifests
//!
//! Repositories can also be declared in `Cargo.toml` under `[package.metadata.fetch-repo]`, one
//! table per repository. The `repo` key holds the specification and every other key is a
//! [`DownloadConfiguration`](crate::DownloadConfiguration) option:
//!
//! ```rust
//! let cargo_toml = r#"
//! [package.metadata.fetch-repo]
//! fixture = { repo = "flippidippi/download-git-repo-fixture#my-branch" }
//! "vendor::tool" = { repo = "gitlab:owner/tool", clone = true, shallow = false }
//! "#;
//!
//! for (name, entry) in fetch_repo::try_parse_toml(cargo_toml)? {
//!     println!("{name}: {}", entry.descriptor);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Entries are fetched with [`fetch_all`](crate::fetch_all) or, on the rayon thread pool,
//! [`fetch_all_par`](crate::fetch_all_par).
//!

mod archive;
mod cleanup;
mod config;
mod descriptor;
mod error;
mod fetch;
pub mod git;
mod helper;
mod manifest;
mod process;
mod resolve;
mod transport;
mod walk;

#[doc(inline)]
pub use crate::archive::{download_archive, extract_archive};
#[doc(inline)]
pub use crate::cleanup::{RetryPolicy, is_transient, remove_tree, remove_tree_with};
#[doc(inline)]
pub use crate::config::{DEFAULT_STRIP, DownloadConfiguration, EntryFilter, FileEntry};
#[doc(inline)]
pub use crate::descriptor::{
    DEFAULT_CHECKOUT, Kind, Provider, RepositoryDescriptor, Target, parse,
};
#[doc(inline)]
pub use crate::error::{Error, FetchError};
#[doc(inline)]
pub use crate::fetch::{Fetcher, fetch_repository};
#[doc(inline)]
pub use crate::helper::{NamedFetchResult, parallel::fetch_all_par, serial::fetch_all};
#[doc(inline)]
pub use crate::manifest::{Manifest, ManifestEntry, ManifestParseError, try_parse, try_parse_toml};
#[doc(inline)]
pub use crate::process::{Invocation, ProcessRunner, SystemRunner};
#[doc(inline)]
pub use crate::resolve::{Mode, resolve_url};
#[doc(inline)]
pub use crate::transport::{HttpTransport, Response, Transport, merge_headers};
#[doc(inline)]
pub use crate::walk::walk;
