//! dupesweep - exact duplicate file detection
//!
//! Walks a directory tree and reports groups of files with byte-identical
//! contents. Work is staged so that most files are never read in full:
//!
//! 1. Files are bucketed by (size, extension); singleton buckets are dropped.
//! 2. Bucket members get a cheap head+tail fingerprint on a bounded worker pool.
//! 3. Members sharing a fingerprint are confirmed with a full SHA-256 digest.
//!
//! The engine lives in [`scanner`] and [`duplicates`]; the rest of the crate is
//! the command-line front end.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, Commands, ConfigArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the parsed command line and return the process exit code.
///
/// # Errors
///
/// Returns an error for fatal failures: an invalid scan root, a worker pool
/// that cannot start, or output that cannot be written. Per-file read errors
/// are not fatal and surface as [`ExitCode::PartialSuccess`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(ref args) => run_scan(args, cli.quiet),
        Commands::Config(ref args) => show_config(args),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Config {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

fn run_scan(args: &ScanArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let mut config = load_config(args.config.as_deref());
    config.merge_scan_args(args);
    log::debug!("Effective configuration: {:?}", config);

    let cancel_token = match signal::install_handler() {
        Ok(token) => token,
        Err(e) => {
            log::warn!("Ctrl+C will not stop the scan cleanly: {}", e);
            signal::CancelToken::new()
        }
    };

    // JSON goes to stdout; keep the bars off so scripts see clean output.
    let hide_progress = quiet || args.output == OutputFormat::Json;
    let progress = Arc::new(Progress::new(hide_progress));

    let finder_config = config
        .to_finder_config()
        .with_cancel_token(cancel_token)
        .with_progress_callback(progress);

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder
        .find_duplicates(&args.path)
        .with_context(|| format!("Scan of {} failed", args.path.display()))?;

    let exit_code = ExitCode::for_scan(&groups, &summary);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Json => JsonOutput::new(&groups, &summary, exit_code)
            .write_to(&mut out, true)
            .context("Failed to write JSON output")?,
        OutputFormat::Text => TextOutput::new(&groups, &summary)
            .write_to(&mut out)
            .context("Failed to write report")?,
    }
    out.flush().context("Failed to flush output")?;

    Ok(exit_code)
}

fn show_config(args: &ConfigArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_deref());
    if let Some(path) = args.config.clone().or_else(Config::config_path) {
        println!("# {}", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(ExitCode::Success)
}
