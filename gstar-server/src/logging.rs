use gstar_core::config::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_DIRECTIVES: &str = "gstar=debug";

/// Installs the global subscriber: stdout plus a daily rolling file.
///
/// `RUST_LOG` wins over `logging.level`. The returned guard flushes the
/// file writer on drop and must live as long as the process.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.dir)?;
    let file_appender = tracing_appender::rolling::daily(&settings.dir, "gstar.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&settings.level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    Ok(guard)
}

fn default_filter(level: &str) -> String {
    format!("{},{}", level.trim(), DEFAULT_DIRECTIVES)
}
