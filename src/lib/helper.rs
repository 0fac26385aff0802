use std::path::{Path, PathBuf};

use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::manifest::{Manifest, ManifestEntry};
use crate::process::ProcessRunner;
use crate::transport::Transport;

/// The outcome of fetching one named manifest entry: where it went, or why it didn't.
pub type NamedFetchResult = Result<(String, PathBuf), FetchError>;

pub mod serial {
    use super::*;

    /// Fetch one manifest entry into `<out_dir>/<name>`.
    pub fn fetch<T, R>(
        fetcher: &Fetcher<T, R>,
        name: String,
        entry: &ManifestEntry,
        out_dir: &Path,
    ) -> NamedFetchResult
    where
        T: Transport,
        R: ProcessRunner,
    {
        let dest = out_dir.join(ManifestEntry::as_path_component(&name));
        match fetcher.fetch(&entry.repo, &dest, &entry.config) {
            Ok(()) => Ok((name, dest)),
            Err(err) => Err(FetchError { name, err }),
        }
    }

    /// Fetch every entry, one after another.
    pub fn fetch_all<T, R>(
        fetcher: &Fetcher<T, R>,
        manifest: &Manifest,
        out_dir: &Path,
    ) -> Vec<NamedFetchResult>
    where
        T: Transport,
        R: ProcessRunner,
    {
        manifest
            .iter()
            .map(|(n, e)| fetch(fetcher, n.clone(), e, out_dir))
            .collect()
    }
}

pub mod parallel {
    use super::*;
    use rayon::prelude::*;

    /// Fetch every entry on the rayon thread pool. Results keep the manifest's order.
    ///
    /// The fetches only stay independent while no entry's directory lies inside another's.
    /// [`try_parse`](crate::try_parse) rejects such manifests; one built by hand must not nest
    /// names like `a` and `a::b`.
    pub fn fetch_all_par<T, R>(
        fetcher: &Fetcher<T, R>,
        manifest: &Manifest,
        out_dir: &Path,
    ) -> Vec<NamedFetchResult>
    where
        T: Transport + Sync,
        R: ProcessRunner + Sync,
    {
        manifest
            .par_iter()
            .map(|(n, e)| super::serial::fetch(fetcher, n.clone(), e, out_dir))
            .collect::<Vec<_>>()
    }
}

#[cfg(test)]
mod test_fetch_all {
    use super::*;
    use crate::error::Error;
    use crate::manifest::try_parse_toml;
    use crate::process::Invocation;
    use crate::transport::{Response, Transport};
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;
    use std::io::Write;

    /// Serves a small archive for every URL except ones containing `missing`.
    struct Archives;

    impl Transport for Archives {
        fn get(&self, url: &str, _: &HeaderMap) -> Result<Response, Error> {
            if url.contains("missing") {
                return Ok(Response {
                    status: StatusCode::NOT_FOUND,
                    body: Vec::new(),
                });
            }
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
            writer
                .start_file("root/README.md", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(url.as_bytes()).unwrap();
            Ok(Response {
                status: StatusCode::OK,
                body: writer.finish().unwrap().into_inner(),
            })
        }
    }

    struct NoProcesses;

    impl ProcessRunner for NoProcesses {
        fn run(&self, invocation: &Invocation) -> std::io::Result<std::process::ExitStatus> {
            panic!("unexpected process: {}", invocation.command_line());
        }
    }

    const MANIFEST: &str = r#"
        [package.metadata.fetch-repo]
        one = { repo = "owner/one" }
        "nested::two" = { repo = "gitlab:owner/two#dev" }
        gone = { repo = "owner/missing" }
    "#;

    fn check(results: Vec<NamedFetchResult>, out_dir: &Path) {
        assert_eq!(results.len(), 3);
        let (ok, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.is_ok());
        assert_eq!(ok.len(), 2);
        let failed = failed.into_iter().next().unwrap().unwrap_err();
        assert_eq!(failed.name, "gone");
        assert!(matches!(failed.err, Error::FetchFailed { .. }));

        let two = out_dir.join("nested").join("two").join("README.md");
        assert_eq!(
            std::fs::read_to_string(two).unwrap(),
            "https://gitlab.com/owner/two/repository/archive.zip?ref=dev"
        );
        assert!(out_dir.join("one/README.md").is_file());
    }

    #[test]
    fn serial_fetch_all() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = try_parse_toml(MANIFEST).unwrap();
        let fetcher = Fetcher::new(Archives, NoProcesses);
        check(serial::fetch_all(&fetcher, &manifest, dir.path()), dir.path());
    }

    #[test]
    fn parallel_fetch_all() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = try_parse_toml(MANIFEST).unwrap();
        let fetcher = Fetcher::new(Archives, NoProcesses);
        check(
            parallel::fetch_all_par(&fetcher, &manifest, dir.path()),
            dir.path(),
        );
    }
}
