//! Lazy traversal of an extracted tree.

use std::path::Path;

use crate::config::FileEntry;

/// Walk everything below `root`, yielding each entry's path relative to `root`.
///
/// Directories come before their contents and siblings are sorted by name. `root` itself is not
/// yielded. Symlinks are reported as files and not followed.
pub fn walk<P: AsRef<Path>>(root: P) -> impl Iterator<Item = std::io::Result<FileEntry>> {
    let root = root.as_ref().to_path_buf();
    walkdir::WalkDir::new(&root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .map(move |entry| {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry
                .path()
                .strip_prefix(&root)
                .map_err(std::io::Error::other)?
                .to_path_buf();
            Ok(FileEntry {
                path,
                is_dir: entry.file_type().is_dir(),
            })
        })
}
