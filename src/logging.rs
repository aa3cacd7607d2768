use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, DEFAULT_LOG_FILTER};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. When `dir` is set and
/// writable, a daily rolling `signal-router.log` is written next to the
/// console output. Keep the returned guard alive for the life of the
/// process or buffered file lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match config.dir.as_deref().and_then(writable_log_dir) {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "signal-router.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });
    let json_layer = config
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_current_span(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = config.dir.as_deref().filter(|_| guard.is_some()) {
        eprintln!("Logging to: {}/signal-router.log", dir);
    }

    guard
}

/// `tracing_appender::rolling::daily` panics if it cannot create the first
/// file, so check the directory up front.
fn writable_log_dir(dir: &str) -> Option<&str> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!(
            "Warning: Could not create log directory {} ({}), file logging disabled",
            dir, e
        );
        return None;
    }

    let probe = std::path::Path::new(dir).join(".signal_router_write_test");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            Some(dir)
        }
        Err(e) => {
            eprintln!(
                "Warning: Could not write to log directory {} ({}), file logging disabled",
                dir, e
            );
            None
        }
    }
}
