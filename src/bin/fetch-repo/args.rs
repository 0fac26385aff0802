use std::path::PathBuf;

use clap::FromArgMatches;
use clap::{CommandFactory, Parser};
use fetch_repo::{DownloadConfiguration, Mode, RepositoryDescriptor};

use crate::error::AppError;

// Shamelessly borrowed from https://github.com/crate-ci/clap-cargo/blob/0378657ffdf2b67bcd6f1ab56e04a1322b92dd0e/src/style.rs
// thanks to https://stackoverflow.com/a/79614957
use anstyle::AnsiColor::*;
use anstyle::Effects;
use anstyle::Style;

const HEADER: Style = Green.on_default().effects(Effects::BOLD);
const USAGE: Style = Green.on_default().effects(Effects::BOLD);
const LITERAL: Style = Cyan.on_default().effects(Effects::BOLD);
const PLACEHOLDER: Style = Cyan.on_default();
pub(crate) const ERROR: Style = Red.on_default().effects(Effects::BOLD);
const VALID: Style = Cyan.on_default().effects(Effects::BOLD);
const INVALID: Style = Yellow.on_default().effects(Effects::BOLD);

const APP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(HEADER)
    .usage(USAGE)
    .literal(LITERAL)
    .placeholder(PLACEHOLDER)
    .error(ERROR)
    .valid(VALID)
    .invalid(INVALID);

#[derive(Debug, Parser)]
#[command(name = "fetch-repo")]
#[command(about = "Download a git repository or archive into a local directory")]
#[command(long_about = None)]
#[command(styles = APP_STYLING)]
#[command(term_width = 80)]
struct Args {
    /// Increase logging verbosity (repeat for more). `RUST_LOG` takes precedence.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Fetch a repository into a directory
    Fetch {
        /// Repository specification, e.g. `owner/name`, `gitlab:owner/name#v2` or
        /// `direct:https://example.com/archive.zip`
        #[arg(value_name = "SPEC")]
        spec: String,

        /// Destination directory. Created if missing; existing files may be overwritten.
        #[arg(value_name = "DEST")]
        dest: PathBuf,

        /// Use `git clone` instead of downloading an archive.
        #[arg(long)]
        clone: bool,

        /// Always make a shallow clone.
        #[arg(long, conflicts_with = "full")]
        shallow: bool,

        /// Never make a shallow clone.
        #[arg(long)]
        full: bool,

        /// Leading path components to strip from the archive [default: 1]
        #[arg(long, value_name = "N")]
        strip: Option<u32>,

        /// Extra request header for the archive download. May be repeated.
        #[arg(long = "header", short = 'H', value_name = "NAME:VALUE")]
        headers: Vec<String>,
    },
    /// Print the URL a repository would be fetched from
    Resolve {
        #[arg(value_name = "SPEC")]
        spec: String,

        /// Resolve the `git clone` URL instead of the archive URL.
        #[arg(long)]
        clone: bool,
    },
    /// Parse a repository specification and print the result
    Parse {
        #[arg(value_name = "SPEC")]
        spec: String,

        /// Output format
        #[arg(long, short = 'f', value_enum, value_name = "FORMAT")]
        format: Option<OutputFormat>,
    },
    /// List the repositories declared in the manifest without fetching them
    List {
        /// Path to the Cargo.toml file. If not given, search for the file in the current and parent
        /// directories.
        #[arg(long, short = 'm', value_name = "PATH")]
        manifest_file: Option<PathBuf>,

        /// Output format
        #[arg(long, short = 'f', value_enum, value_name = "FORMAT")]
        format: Option<OutputFormat>,
    },
    /// Fetch every repository declared in the manifest
    Sync {
        /// Path to the Cargo.toml file. If not given, search for the file in the current and parent
        /// directories.
        #[arg(long, short = 'm', value_name = "PATH")]
        manifest_file: Option<PathBuf>,

        /// Directory to fetch into. Each repository goes into a subdirectory named after its
        /// manifest entry. Defaults to the current directory.
        #[arg(long, short = 'o', value_name = "PATH")]
        out_dir: Option<PathBuf>,

        /// Number of threads to spawn. Defaults to one per logical CPU.
        #[arg(long, short = 't', value_name = "NUM-THREADS")]
        threads: Option<u32>,
    },
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Output in JSON format
    Json,
    /// Output in TOML format
    Toml,
}

#[derive(Debug)]
pub struct ValidatedArgs {
    pub verbosity: u8,
    pub command: ValidatedCommand,
}

#[derive(Debug)]
pub enum ValidatedCommand {
    Fetch {
        spec: String,
        dest: PathBuf,
        config: DownloadConfiguration,
    },
    Resolve {
        descriptor: RepositoryDescriptor,
        mode: Mode,
    },
    Parse {
        descriptor: RepositoryDescriptor,
        format: Option<OutputFormat>,
    },
    List {
        manifest_file: PathBuf,
        format: Option<OutputFormat>,
    },
    Sync {
        manifest_file: PathBuf,
        out_dir: PathBuf,
    },
}

impl ValidatedArgs {
    fn detect_out_dir(arg: Option<PathBuf>) -> Result<PathBuf, AppError> {
        Ok(match arg {
            Some(path) => path,
            None => std::env::current_dir()?,
        })
    }

    fn detect_manifest_file(arg: Option<PathBuf>) -> Result<PathBuf, AppError> {
        match arg {
            Some(path) => Ok(path),
            None => {
                let mut current_dir = std::env::current_dir()?;
                loop {
                    let manifest = current_dir.join("Cargo.toml");
                    if manifest.is_file() {
                        break Ok(manifest);
                    }
                    if !current_dir.pop() {
                        return Err(AppError::arg_validation(
                            "could not find 'Cargo.toml' in the current directory or any parent directory".to_string(),
                        ));
                    }
                }
            }
        }
    }

    fn parse_spec(spec: &str) -> Result<RepositoryDescriptor, AppError> {
        fetch_repo::parse(spec).map_err(|e| AppError::arg_validation(e.to_string()))
    }

    fn parse_header(header: &str) -> Result<(String, String), AppError> {
        match header.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(AppError::arg_validation(format!(
                "expected a header of the form NAME:VALUE, got '{header}'"
            ))),
        }
    }
}

impl TryFrom<Command> for ValidatedCommand {
    type Error = AppError;

    fn try_from(command: Command) -> Result<Self, Self::Error> {
        match command {
            Command::Fetch {
                spec,
                dest,
                clone,
                shallow,
                full,
                strip,
                headers,
            } => {
                ValidatedArgs::parse_spec(&spec)?;
                let mut config = DownloadConfiguration::default().with_clone(clone);
                if shallow || full {
                    config = config.with_shallow(shallow);
                }
                if let Some(strip) = strip {
                    config = config.with_strip(strip);
                }
                for header in &headers {
                    let (name, value) = ValidatedArgs::parse_header(header)?;
                    config = config.with_header(name, value);
                }
                Ok(ValidatedCommand::Fetch { spec, dest, config })
            }
            Command::Resolve { spec, clone } => Ok(ValidatedCommand::Resolve {
                descriptor: ValidatedArgs::parse_spec(&spec)?,
                mode: Mode::from_clone(clone),
            }),
            Command::Parse { spec, format } => Ok(ValidatedCommand::Parse {
                descriptor: ValidatedArgs::parse_spec(&spec)?,
                format,
            }),
            Command::List {
                manifest_file,
                format,
            } => Ok(ValidatedCommand::List {
                manifest_file: ValidatedArgs::detect_manifest_file(manifest_file)?,
                format,
            }),
            Command::Sync {
                manifest_file,
                out_dir,
                threads,
            } => {
                if let Some(ref dir) = out_dir
                    && !dir.exists()
                {
                    return Err(AppError::arg_validation(format!(
                        "output directory does not exist: {}",
                        dir.display()
                    )));
                }

                if let Some(threads) = threads {
                    rayon::ThreadPoolBuilder::new()
                        .num_threads(threads as usize)
                        .build_global()
                        .map_err(|e| {
                            AppError::arg_validation(format!("Failed to set thread count: {e}"))
                        })?;
                }

                Ok(ValidatedCommand::Sync {
                    manifest_file: ValidatedArgs::detect_manifest_file(manifest_file)?,
                    out_dir: ValidatedArgs::detect_out_dir(out_dir)?,
                })
            }
        }
    }
}

static VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn parse() -> Result<ValidatedArgs, AppError> {
    let matches = Args::command().version(VERSION).get_matches();
    let args = match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => {
            err.format(&mut Args::command()).exit();
        }
    };
    Ok(ValidatedArgs {
        verbosity: args.verbose,
        command: ValidatedCommand::try_from(args.command)?,
    })
}
