use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use fetch_repo::{
    DownloadConfiguration, Fetcher, HttpTransport, Manifest, Mode, SystemRunner, resolve_url,
};

mod args;
mod error;

use args::{ERROR, OutputFormat, ValidatedCommand};
use error::AppError;

/// What `list` prints for each manifest entry.
#[derive(serde::Serialize)]
struct ListedEntry<'a> {
    repo: &'a str,
    url: String,
    #[serde(flatten)]
    config: &'a DownloadConfiguration,
}

fn initialize_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn render<T: serde::Serialize>(value: &T, format: &OutputFormat) -> Result<String, AppError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("serialising to JSON"),
        OutputFormat::Toml => toml::to_string(value).context("serialising to TOML"),
    }
    .map_err(AppError::render)
}

fn read_manifest(manifest_file: &Path) -> Result<Manifest, AppError> {
    let manifest = manifest_file.display().to_string();
    let document = std::fs::read_to_string(manifest_file)
        .map_err(|err| AppError::manifest_read(manifest.clone(), err))?;
    fetch_repo::try_parse_toml(&document).map_err(|err| AppError::manifest_parse(manifest, err))
}

fn report(err: &dyn std::error::Error) {
    eprintln!("{ERROR}error:{ERROR:#} {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn system_fetcher() -> Result<Fetcher<HttpTransport, SystemRunner>, AppError> {
    Fetcher::system().map_err(AppError::client)
}

fn run(command: ValidatedCommand) -> Result<(), AppError> {
    match command {
        ValidatedCommand::Fetch { spec, dest, config } => {
            system_fetcher()?
                .fetch(&spec, &dest, &config)
                .map_err(|err| AppError::fetch_repository(spec.clone(), err))?;
            println!("✅ Fetched {spec} into {}", dest.display());
        }
        ValidatedCommand::Resolve { descriptor, mode } => {
            println!("{}", resolve_url(&descriptor, mode));
        }
        ValidatedCommand::Parse { descriptor, format } => match format {
            Some(format) => println!("{}", render(&descriptor, &format)?),
            None => println!("{descriptor}"),
        },
        ValidatedCommand::List {
            manifest_file,
            format,
        } => {
            let manifest = read_manifest(&manifest_file)?;
            let listed = manifest
                .iter()
                .map(|(name, entry)| {
                    let url = resolve_url(&entry.descriptor, Mode::from_clone(entry.config.clone));
                    let listed = ListedEntry {
                        repo: &entry.repo,
                        url,
                        config: &entry.config,
                    };
                    (name.as_str(), listed)
                })
                .collect::<BTreeMap<_, _>>();
            match format {
                Some(format) => println!("{}", render(&listed, &format)?),
                None => {
                    for (name, entry) in &listed {
                        println!("{name}: {} ({})", entry.repo, entry.url);
                    }
                }
            }
        }
        ValidatedCommand::Sync {
            manifest_file,
            out_dir,
        } => {
            let manifest = read_manifest(&manifest_file)?;
            let fetcher = system_fetcher()?;
            let mut failures = 0usize;
            for result in fetch_repo::fetch_all_par(&fetcher, &manifest, &out_dir) {
                match result {
                    Ok((name, path)) => println!("✅ {name} -> {}", path.display()),
                    Err(err) => {
                        failures += 1;
                        report(&err);
                    }
                }
            }
            let fetched = manifest.len() - failures;
            println!("\n🎉 Fetched {fetched} of {} repositories", manifest.len());
            if failures > 0 {
                return Err(AppError::fetch());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let result = args::parse().and_then(|args| {
        initialize_logging(args.verbosity);
        log::debug!("{args:?}");
        run(args.command)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            err.into()
        }
    }
}
