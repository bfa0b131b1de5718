//! Logging configuration for the replay tool.
//!
//! Logs go to stderr so they never interleave with the replay report on
//! stdout. Set `DEBUG_LOGGING=1` (or pass `--verbose`) to enable debug
//! output for the hustle crates.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize stderr logging.
///
/// # Behavior
/// - **Default:** INFO+ for everything
/// - **Debug:** DEBUG+ for hustle crates when `DEBUG_LOGGING` is set or `verbose` is true
/// - **Quiet:** WARN+ only
pub fn init(verbose: bool, quiet: bool) {
    let debug_logging = verbose || std::env::var("DEBUG_LOGGING").is_ok();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter_directive = if debug_logging {
        // debug for hustle crates, info for dependencies
        "info,hustle_core=debug,hustle_replay=debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(EnvFilter::new(filter_directive))
        .init();

    tracing::debug!(debug_logging, "Replay logging initialized");
}
