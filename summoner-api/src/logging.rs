use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber. When a Sentry DSN is configured, error
/// events are also forwarded to Sentry; keep the returned guard alive for the
/// lifetime of the process so pending events are flushed on exit.
pub fn init(config: &LoggingConfig) -> Option<sentry::ClientInitGuard> {
    let guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    guard
}
