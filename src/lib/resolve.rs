//! Turning a [`RepositoryDescriptor`] into the URL that is actually fetched.

use crate::descriptor::{Provider, RepositoryDescriptor, Target};

/// Whether the URL is for `git clone` or for downloading a zip archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Clone,
    Archive,
}

impl Mode {
    pub fn from_clone(clone: bool) -> Self {
        if clone { Mode::Clone } else { Mode::Archive }
    }
}

fn has_scheme(origin: &str) -> bool {
    let lower = origin.to_ascii_lowercase();
    ["http://", "https://", "ftp://", "ftps://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn is_ssh(origin: &str) -> bool {
    origin
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("git@"))
}

/// Add `https://` to a bare host and terminate it with the separator that precedes the owner:
/// `:` for SSH-style `git@host`, `/` otherwise.
fn normalise_origin(origin: &str) -> String {
    if is_ssh(origin) {
        format!("{origin}:")
    } else if has_scheme(origin) {
        format!("{origin}/")
    } else {
        format!("https://{origin}/")
    }
}

/// Build the fetch URL for `descriptor`.
///
/// Direct descriptors return their URL unchanged whatever the mode. Hosted descriptors give
/// `<origin><owner>/<name>.git` when cloning, and the provider's archive URL for the checkout
/// otherwise.
///
/// ```rust
/// use fetch_repo::{parse, resolve_url, Mode};
///
/// let repo = parse("owner/name#v1")?;
/// assert_eq!(resolve_url(&repo, Mode::Clone), "https://github.com/owner/name.git");
/// assert_eq!(
///     resolve_url(&repo, Mode::Archive),
///     "https://github.com/owner/name/archive/v1.zip"
/// );
/// # Ok::<(), fetch_repo::Error>(())
/// ```
pub fn resolve_url(descriptor: &RepositoryDescriptor, mode: Mode) -> String {
    let (provider, origin, owner, name) = match descriptor.target() {
        Target::Direct { url } => return url.clone(),
        Target::Hosted {
            provider,
            origin,
            owner,
            name,
        } => (provider, origin, owner, name),
    };
    let base = normalise_origin(origin);
    let checkout = descriptor.checkout();
    match mode {
        Mode::Clone => format!("{base}{owner}/{name}.git"),
        Mode::Archive => match provider {
            Provider::GitHub => format!("{base}{owner}/{name}/archive/{checkout}.zip"),
            Provider::GitLab => {
                format!("{base}{owner}/{name}/repository/archive.zip?ref={checkout}")
            }
            Provider::Bitbucket => format!("{base}{owner}/{name}/get/{checkout}.zip"),
        },
    }
}
