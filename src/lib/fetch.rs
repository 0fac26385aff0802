//! The single entry point tying parsing, URL resolution and the two fetch strategies together.

use std::path::Path;

use crate::archive::download_archive;
use crate::config::DownloadConfiguration;
use crate::descriptor::parse;
use crate::error::Error;
use crate::git;
use crate::process::{ProcessRunner, SystemRunner};
use crate::resolve::{Mode, resolve_url};
use crate::transport::{HttpTransport, Transport};

/// Fetches repositories using a given HTTP transport and process runner.
///
/// A `Fetcher` holds no state between calls; concurrent calls are fine as long as they target
/// different destinations.
#[derive(Debug, Clone)]
pub struct Fetcher<T, R> {
    transport: T,
    runner: R,
}

impl Fetcher<HttpTransport, SystemRunner> {
    /// A fetcher which downloads with `reqwest` and clones with the `git` on `PATH`.
    pub fn system() -> Result<Self, Error> {
        Ok(Self::new(HttpTransport::new()?, SystemRunner))
    }
}

impl<T: Transport, R: ProcessRunner> Fetcher<T, R> {
    pub fn new(transport: T, runner: R) -> Self {
        Self { transport, runner }
    }

    /// Fetch the repository described by `spec` into `dest`.
    ///
    /// Nothing written to `dest` is rolled back on failure.
    pub fn fetch<P: AsRef<Path>>(
        &self,
        spec: &str,
        dest: P,
        config: &DownloadConfiguration,
    ) -> Result<(), Error> {
        let dest = dest.as_ref();
        let descriptor = parse(spec)?;
        let mode = Mode::from_clone(config.clone);
        let url = match descriptor.url() {
            Some(url) => url.to_string(),
            None => resolve_url(&descriptor, mode),
        };
        log::info!("fetching {descriptor} from {url}");
        match mode {
            Mode::Clone => git::clone(&self.runner, &url, dest, descriptor.checkout(), config),
            Mode::Archive => download_archive(&self.transport, &url, dest, config),
        }
    }
}

/// Fetch the repository described by `spec` into `dest` with the system transport and `git`.
///
/// ```no_run
/// use fetch_repo::{fetch_repository, DownloadConfiguration};
///
/// fetch_repository(
///     "flippidippi/download-git-repo-fixture#my-branch",
///     "fixture",
///     &DownloadConfiguration::default(),
/// )?;
/// # Ok::<(), fetch_repo::Error>(())
/// ```
pub fn fetch_repository<P: AsRef<Path>>(
    spec: &str,
    dest: P,
    config: &DownloadConfiguration,
) -> Result<(), Error> {
    Fetcher::system()?.fetch(spec, dest, config)
}
