//! Support for downloading and extracting zip archives.
//!
//! With the default options the archive is extracted into a staging directory next to the
//! destination. If the staging directory then holds a single directory (the `<repo>-<ref>/`
//! wrapper that hosting providers add), that directory's contents are moved into the
//! destination instead of the wrapper itself. Only one level is ever collapsed, whatever the
//! `strip` count.

use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::cleanup;
use crate::config::{DownloadConfiguration, EntryFilter};
use crate::error::Error;
use crate::transport::{Transport, merge_headers};
use crate::walk::walk;

const STAGING_PREFIX: &str = ".fetch-repo-";

/// Download the zip archive at `url` and extract it into `dest` according to `config`.
pub fn download_archive<T, P>(
    transport: &T,
    url: &str,
    dest: P,
    config: &DownloadConfiguration,
) -> Result<(), Error>
where
    T: Transport,
    P: AsRef<Path>,
{
    let dest = dest.as_ref();
    let headers = merge_headers(&config.headers)?;
    log::debug!("GET {url}");
    let response = transport.get(url, &headers)?;
    if !response.status.is_success() {
        return Err(Error::FetchFailed {
            status: response.status,
            url: url.to_string(),
        });
    }
    log::debug!("received {} bytes from {url}", response.body.len());
    let mut archive = ZipArchive::new(Cursor::new(response.body))?;
    extract_archive(&mut archive, dest, config.strip(), config.filter.as_ref())?;
    log::info!("extracted {url} into {}", dest.display());
    Ok(())
}

/// Extract `archive` into `dest`, collapsing a single root directory when `strip > 0` and
/// keeping only the entries `filter` accepts.
pub fn extract_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    dest: &Path,
    strip: u32,
    filter: Option<&EntryFilter>,
) -> Result<(), Error> {
    if strip == 0 && filter.is_none() {
        fs::create_dir_all(dest)?;
        archive.extract(dest)?;
        return Ok(());
    }

    let parent = staging_parent(dest);
    fs::create_dir_all(parent)?;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)?;
    log::debug!("staging archive in {}", staging.path().display());
    archive.extract(staging.path())?;

    let root = if strip > 0 {
        collapse_root(staging.path())?
    } else {
        staging.path().to_path_buf()
    };
    fs::create_dir_all(dest)?;
    move_tree(&root, dest, filter)?;

    cleanup::remove_tree(staging.keep())
}

// Staging happens next to `dest` so that moving files out of it is a rename on one filesystem.
fn staging_parent(dest: &Path) -> &Path {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// The single directory inside `dir`, if that is all `dir` contains. Otherwise `dir` itself.
fn collapse_root(dir: &Path) -> Result<PathBuf, Error> {
    let mut entries = fs::read_dir(dir)?;
    let (Some(first), None) = (entries.next(), entries.next()) else {
        return Ok(dir.to_path_buf());
    };
    let first = first?;
    if first.file_type()?.is_dir() {
        Ok(first.path())
    } else {
        Ok(dir.to_path_buf())
    }
}

/// Move every entry below `root` that `filter` accepts into the same relative place under
/// `dest`. Directories of accepted files are created as needed even if the filter rejected the
/// directory itself.
fn move_tree(root: &Path, dest: &Path, filter: Option<&EntryFilter>) -> Result<(), Error> {
    for entry in walk(root) {
        let entry = entry?;
        if let Some(filter) = filter
            && !filter.includes(&entry)
        {
            log::trace!("skipping {}", entry.path.display());
            continue;
        }
        let target = dest.join(&entry.path);
        if entry.is_dir {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(p) = target.parent()
                && !p.exists()
            {
                fs::create_dir_all(p)?;
            }
            move_file(&root.join(&entry.path), &target)?;
        }
    }
    Ok(())
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to) {
        Err(err) if err.kind() == std::io::ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::io::Write;

    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;

    use crate::error::Error;
    use crate::transport::{Response, Transport};

    /// Build a zip in memory. Entries with no contents are directories.
    pub fn zip_of(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in entries {
            match contents {
                Some(contents) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(contents.as_bytes()).unwrap();
                }
                None => writer.add_directory(*name, options).unwrap(),
            }
        }
        writer.finish().unwrap().into_inner()
    }

    /// Serves one canned response and remembers what was asked for.
    pub struct FakeTransport {
        pub status: StatusCode,
        pub body: Vec<u8>,
        pub requests: RefCell<Vec<(String, HeaderMap)>>,
    }

    impl FakeTransport {
        pub fn ok(body: Vec<u8>) -> Self {
            Self {
                status: StatusCode::OK,
                body,
                requests: RefCell::new(Vec::new()),
            }
        }

        pub fn status(status: StatusCode) -> Self {
            Self {
                status,
                ..Self::ok(Vec::new())
            }
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str, headers: &HeaderMap) -> Result<Response, Error> {
            self.requests
                .borrow_mut()
                .push((url.to_string(), headers.clone()));
            Ok(Response {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }
}
