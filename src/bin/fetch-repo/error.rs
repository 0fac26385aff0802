use std::process::ExitCode;

/// Categories of application errors that can be matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorKind {
    /// Argument validation errors
    ArgValidation,
    /// General IO errors
    IO,
    /// Manifest file reading errors
    ManifestRead,
    /// Manifest file parsing errors
    ManifestParse,
    /// Fetching errors
    Fetch,
    /// Output rendering errors
    Render,
}

/// Internal error type that contains all application error variants.
#[derive(Debug, thiserror::Error)]
pub enum AppErrorInner {
    #[error("Argument error: {0}")]
    ArgValidation(String),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("Failed to read manifest file: {manifest}")]
    ManifestRead {
        manifest: String,
        #[source]
        err: std::io::Error,
    },
    #[error("Failed to parse manifest file: {manifest}")]
    ManifestParse {
        manifest: String,
        #[source]
        err: fetch_repo::ManifestParseError,
    },
    #[error("Failed to fetch '{spec}'")]
    FetchRepository {
        spec: String,
        #[source]
        err: fetch_repo::Error,
    },
    #[error("Failed to fetch one or more repositories")]
    Fetch,
    #[error("Failed to set up the HTTP client")]
    Client(#[source] fetch_repo::Error),
    #[error("Failed to render output: {0:#}")]
    Render(anyhow::Error),
}

/// The main application-level error type, carrying the kind used to pick the exit code.
///
/// Failures of individual manifest entries during `sync` are reported as they happen, so the
/// `Fetch` kind only exists to produce the correct `ExitCode`.
#[derive(Debug)]
pub struct AppError(Box<AppErrorInner>, AppErrorKind);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl AppError {
    pub fn new(inner: AppErrorInner, kind: AppErrorKind) -> Self {
        Self(Box::new(inner), kind)
    }

    pub fn error_kind(&self) -> &AppErrorKind {
        &self.1
    }

    pub fn arg_validation(msg: String) -> Self {
        Self::new(AppErrorInner::ArgValidation(msg), AppErrorKind::ArgValidation)
    }

    pub fn manifest_read(manifest: String, err: std::io::Error) -> Self {
        Self::new(
            AppErrorInner::ManifestRead { manifest, err },
            AppErrorKind::ManifestRead,
        )
    }

    pub fn manifest_parse(manifest: String, err: fetch_repo::ManifestParseError) -> Self {
        Self::new(
            AppErrorInner::ManifestParse { manifest, err },
            AppErrorKind::ManifestParse,
        )
    }

    pub fn fetch_repository(spec: String, err: fetch_repo::Error) -> Self {
        Self::new(
            AppErrorInner::FetchRepository { spec, err },
            AppErrorKind::Fetch,
        )
    }

    pub fn fetch() -> Self {
        Self::new(AppErrorInner::Fetch, AppErrorKind::Fetch)
    }

    pub fn client(err: fetch_repo::Error) -> Self {
        Self::new(AppErrorInner::Client(err), AppErrorKind::IO)
    }

    pub fn render(err: anyhow::Error) -> Self {
        Self::new(AppErrorInner::Render(err), AppErrorKind::Render)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::new(AppErrorInner::IO(err), AppErrorKind::IO)
    }
}

impl From<AppError> for ExitCode {
    fn from(error: AppError) -> Self {
        ExitCode::from(match error.error_kind() {
            AppErrorKind::Fetch => 1,
            AppErrorKind::ArgValidation => 2,
            _ => 3,
        })
    }
}
