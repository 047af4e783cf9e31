use color_eyre::{
    eyre::Context as _,
    Result,
};
use std::{
    fs::File,
    sync::Arc,
};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};
use usage_insights_config::get_data_dir;

const LOG_FILE: &str = concat!(env!("CARGO_PKG_NAME"), ".log");

/// Crates whose events are shown without `RUST_LOG`.
const CRATES: [&str; 3] = [
    "kontent_usage_insights",
    "usage_insights_collector",
    "usage_insights_config",
];

fn default_filter(level: &str) -> EnvFilter {
    let directives = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(format!("warn,{directives}"))
}

/// Logs to stderr (`RUST_LOG`, else `info` or `debug` with `--verbose`) and at debug level to a log file in the
/// data directory.
pub fn init_logging(verbose: bool) -> Result<()> {
    let directory = get_data_dir();
    std::fs::create_dir_all(&directory)
        .wrap_err_with(|| format!("Failed to create data directory {}", directory.display()))?;
    let log_path = directory.join(LOG_FILE);
    let log_file = File::create(&log_path).wrap_err_with(|| format!("Failed to create {}", log_path.display()))?;

    let level = if verbose { "debug" } else { "info" };
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(stderr_filter),
        )
        .with(
            fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false)
                .with_filter(default_filter("debug")),
        )
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .wrap_err("Failed to initialize tracing subscriber")
}
