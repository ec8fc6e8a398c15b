use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use super::config::MonitoringConfig;

pub fn init_logging(monitoring: &MonitoringConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&monitoring.log_level));

    // stdout carries scan output, so logs go to stderr
    let initialized = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();

    if initialized.is_ok() {
        tracing::debug!("Logging initialized at level: {}", monitoring.log_level);
    }
}
