//! Log subscriber setup for the `intcode` binary.
//!
//! Library events use the `intcode::vm` and `intcode::pipeline` targets.
//! `RUST_LOG` takes precedence over `--log-level` when set.

use std::io;

use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Multi-line, with timestamps
    Pretty,
    /// One line per event
    Compact,
    /// Newline delimited JSON
    Json,
}

pub fn init(level: Level, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    // Logs go to stderr; stdout carries program output.
    tracing_subscriber::registry()
        .with(create_format_layer(format, io::stderr).with_filter(filter))
        .init();
}

fn default_filter(level: Level) -> EnvFilter {
    EnvFilter::new(format!("warn,intcode={}", level.as_str().to_ascii_lowercase()))
}

fn create_format_layer<W, F>(format: LogFormat, make_writer: F) -> impl Layer<tracing_subscriber::Registry>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
