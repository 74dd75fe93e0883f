//! Logging setup for the `dupesweep` binary.
//!
//! The library only emits through the `log` facade. The binary installs an
//! `env_logger` backend whose level is chosen by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! Debug builds print a timestamp and, when verbose, the module path.
//! Release builds print level and message only.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupesweep::logging::init_logging;
//!
//! // -vv: per-file skip decisions become visible
//! init_logging(2, false);
//! log::trace!("Skipping symlink: /tmp/link");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Crates whose debug output would drown per-file scan traces.
const NOISY_DEPENDENCIES: &[&str] = &["globset", "ignore"];

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// Calling this more than once is harmless: later calls leave the first
/// logger in place.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by RUST_LOG)
pub fn init_logging(verbose: u8, quiet: bool) {
    let use_env = env::var_os("RUST_LOG").is_some();
    let mut builder = Builder::new();

    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
        for module in NOISY_DEPENDENCIES {
            builder.filter_module(module, LevelFilter::Warn);
        }
    }

    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
        return;
    }

    if use_env {
        log::debug!("Logging configured from RUST_LOG");
    } else {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(verbose, quiet)
        );
    }
}

/// Map CLI flags to a level. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            let timestamp = buf.timestamp_seconds();

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{timestamp} {level_style}{level:<5}{level_style:#} [{}] {}",
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{timestamp} {level_style}{level:<5}{level_style:#} {}",
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(buf, "{level_style}{level:<5}{level_style:#} {}", record.args())
        });
    }
}

/// Name of the currently enabled maximum level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
