//! Logging setup for the mailprobe binaries.

use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initialises the global tracing subscriber.
///
/// The level comes from the `LOG_LEVEL` environment variable, defaulting to
/// `TRACE` in debug builds and `INFO` in release builds. Only events from
/// the mailprobe crates are emitted.
pub fn init() {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    let level = std::env::var("LOG_LEVEL").map_or(default, |level| {
        LevelFilter::from_str(level.as_str()).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {default}");
            default
        })
    });

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("mailprobe")
                })),
        )
        .init();
}
