//! Logging initialization for both the service and the one-shot commands.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

pub fn init_logging(verbose: bool) {
    let (app_level, default_level, level) = if verbose {
        (LevelFilter::DEBUG, LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::INFO, LevelFilter::WARN, "info")
    };
    let app_filter = Targets::new()
        .with_target("cambio", app_level)
        .with_default(default_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(app_filter)
        .with(env_filter)
        .init();
}
