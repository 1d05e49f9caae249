use crate::config::settings::{LogFormat, LoggingConfig, Settings};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing from the SDK settings. Falls back to the `LOG_LEVEL`
/// and `LOG_FORMAT` environment variables, then to compact `info` output.
/// Opt-in: consumers embedding the SDK in an application with its own
/// subscriber simply never call this.
pub fn run(settings: &Settings) {
    let logging_config = settings.logging.clone().unwrap_or_else(|| {
        LoggingConfig::new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            LogFormat::from_env(),
        )
    });
    init_logging(&logging_config);
}

/// Initialize tracing with the desired config.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true)
                .with_ansi(false);

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}
