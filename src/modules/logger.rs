use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "gemini-proxy.log";

/// Build the env filter, `RUST_LOG` wins over the default level
fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize global logging.
///
/// Console output is always on. When `log_dir` is given a daily rolling file is added;
/// the returned guard must live as long as the process or buffered lines are lost.
pub fn init_logger(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Forward `log` records from dependencies into tracing
    let _ = tracing_log::LogTracer::init();

    let console = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(build_filter());

    match log_dir {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("Failed to create log dir {}: {}", dir.display(), e);
                let _ = tracing_subscriber::registry().with(console).try_init();
                return None;
            }
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(build_filter());
            let _ = tracing_subscriber::registry()
                .with(console)
                .with(file)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::registry().with(console).try_init();
            None
        }
    }
}
