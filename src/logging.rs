//! Structured logging initialization for snapshelf.
//!
//! Supports both human-friendly and machine-readable (JSON) output formats,
//! with TTY detection and verbosity control.

use std::io::{self, IsTerminal};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default filter directive for the given verbosity.
///
/// `quiet` wins over `verbose`.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "snapshelf=error";
    }
    match verbose {
        0 => "snapshelf=info",
        1 => "snapshelf=debug",
        _ => "snapshelf=trace",
    }
}

/// Initialize the tracing subscriber based on CLI flags and environment.
///
/// # Arguments
///
/// * `json` - If true, output structured JSON logs for machine consumption
/// * `verbose` - Verbosity level: 0 = info, 1 = debug, 2+ = trace
/// * `quiet` - If true, suppress non-essential output (only errors)
///
/// # Environment Variables
///
/// * `RUST_LOG` - Override default filter (e.g., "snapshelf=debug,xcap=warn")
///
/// Logs always go to stderr so stdout stays parseable.
pub fn init_logging(json: bool, verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr);

        // try_init: the shell and tests may call this more than once
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    } else if io::stderr().is_terminal() {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr);

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    } else {
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_writer(io::stderr);

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    }
}
