use std::io;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STDOUT_FILTER: &str = "info,llm_request=info,web_request=info,notes=info,catalog=warn";
const FILE_FILTER: &str = "info,llm_request=debug,notes=debug,catalog=info";

/// Installs the service subscriber: stdout plus a daily rolling file under `logs/`.
///
/// `RUST_LOG` overrides the stdout filter.
pub fn configure_logging() {
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(STDOUT_FILTER));
    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(stdout_filter);

    let file_appender = rolling::daily("logs", "scentmatch.log");
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}
