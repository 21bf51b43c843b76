/*!
 * Logging Module
 * Console and rolling-file tracing output
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::config::AppConfig;

const LOG_DIR: &str = "logs";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Flushes buffered log lines when dropped. Hold it for the life of the process.
#[must_use = "dropping the guards stops the background log writers"]
pub struct LogGuards(#[allow(dead_code)] Vec<WorkerGuard>);

/// Install the global subscriber: JSON output in production, pretty console
/// output otherwise, plus `logs/app.log` and an errors-only `logs/error.log`.
pub fn init(config: &AppConfig) -> LogGuards {
    let production = config.is_production();

    let level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| if production { "info" } else { "debug" }.to_string());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "portfolio_api={},tower_http=debug,axum=debug,mongodb=warn",
            level
        ))
    });

    if let Err(e) = std::fs::create_dir_all(LOG_DIR) {
        eprintln!("could not create log directory {:?}: {}", LOG_DIR, e);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(LOG_DIR, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(LOG_DIR, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let layers: Vec<BoxedLayer> = if production {
        vec![
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .boxed(),
            fmt::layer()
                .json()
                .with_writer(error_writer)
                .with_file(true)
                .with_line_number(true)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
            fmt::layer()
                .json()
                .with_writer(console_writer)
                .with_target(false)
                .boxed(),
        ]
    } else {
        vec![
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            fmt::layer()
                .with_writer(error_writer)
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
            fmt::layer().with_writer(console_writer).pretty().boxed(),
        ]
    };

    match tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
    {
        Ok(()) => tracing::info!("Logging initialized for {} environment", config.environment),
        Err(e) => eprintln!("logging already initialized: {}", e),
    }

    LogGuards(vec![file_guard, error_guard, console_guard])
}
