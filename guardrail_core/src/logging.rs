//! Tracing setup for the guardrail calculator.
//!
//! Everything is written to stderr. `guardrail calc --json` and the batch
//! summary own stdout, so a warning about an out-of-range dose or an
//! unmatched weight band never ends up inside a JSON report.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when RUST_LOG is unset
///
/// Dose-range and weight-band warnings stay visible; per-request `info`
/// lines only show up on request.
const DEFAULT_LEVEL: &str = "warn";

/// Install the stderr subscriber used by the CLI
pub fn init() {
    init_with_level(DEFAULT_LEVEL)
}

/// Install the stderr subscriber, falling back to `default_level`
///
/// RUST_LOG wins when it parses, e.g. `RUST_LOG=guardrail_core=debug` shows
/// each unit conversion and band match.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
