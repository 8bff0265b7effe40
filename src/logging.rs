//! Logging setup for the `todoboard` binary.
//!
//! The library only talks to the `log` facade; [`init_logging`] installs
//! `env_logger`. The level comes from, in priority order:
//!
//! 1. the `RUST_LOG` environment variable
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. `warn` otherwise, so a plain scan prints only its results
//!
//! Dependencies (`ignore`, `jwalk`, ...) stay at `warn` unless `RUST_LOG`
//! says otherwise.
//!
//! # Example
//!
//! ```rust,no_run
//! use todoboard::logging::init_logging;
//!
//! // -v
//! init_logging(1, false);
//! log::debug!("Cache hit");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

const CRATE_TARGET: &str = "todoboard";

/// Install the logger.
///
/// Returns `false` when a logger was already installed (e.g. `run_app`
/// called twice in one process); the first configuration stays active.
pub fn init_logging(verbose: u8, quiet: bool) -> bool {
    let mut builder = Builder::new();

    let from_env = env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else {
        builder
            .filter_level(LevelFilter::Warn)
            .filter_module(CRATE_TARGET, determine_level(verbose, quiet));
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_millis(),
                level,
                record.target(),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });

    let installed = builder.try_init().is_ok();
    if installed {
        log::debug!(
            "Logging initialized ({})",
            if from_env { "RUST_LOG" } else { "flags" }
        );
    }
    installed
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
