/// The main error enum for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The repository string matched none of the recognised forms.
    #[error("invalid repository string: '{spec}'")]
    InvalidSpecification { spec: String },

    /// The archive server answered with a non-success status.
    #[error("failed to download {url}: {status}")]
    FetchFailed {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("git clone of {url} exited with status {status}")]
    CloneFailed {
        url: String,
        status: std::process::ExitStatus,
    },

    #[error("git checkout of '{checkout}' exited with status {status}")]
    CheckoutFailed {
        checkout: String,
        status: std::process::ExitStatus,
    },

    /// Removing a directory tree failed. The repository contents were already in place when
    /// this happened.
    #[error("failed to remove {}", path.display())]
    CleanupFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid HTTP header '{name}'")]
    InvalidHeader { name: String },

    /// The external program could not be started at all.
    #[error("failed to run '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),
}

impl Error {
    /// Whether this error happened while cleaning up after an otherwise successful fetch.
    pub fn is_cleanup(&self) -> bool {
        matches!(self, Error::CleanupFailed { .. })
    }
}

/// An error which occurred while fetching a named manifest entry.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch '{name}'")]
pub struct FetchError {
    pub name: String,
    #[source]
    pub err: Error,
}
