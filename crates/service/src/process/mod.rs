mod utils;

use std::time::Duration;

use tokio::time::timeout;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::{http, Config, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for failures that end the process
const EXIT_SERVER_FAILED: i32 = 1;
const EXIT_SETUP_FAILED: i32 = 3;
const EXIT_SHUTDOWN_TIMEOUT: i32 = 4;

/// Install the global subscriber. Keep the guard alive for as long as
///  logs should be flushed.
pub fn init_tracing(log_level: tracing::Level) -> WorkerGuard {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();
    guard
}

pub async fn spawn_service(service_config: &Config) {
    let log_level = service_config
        .tracing_level()
        .unwrap_or(tracing::Level::INFO);
    let _guard = init_tracing(log_level);

    utils::register_panic_logger();
    utils::report_build_info();

    let utils::ShutdownBlocker { waiter, stop_rx } = match utils::shutdown_blocker(
        utils::SIGTERM_DRAIN_PERIOD,
    ) {
        Ok(blocker) => blocker,
        Err(e) => {
            tracing::error!("error installing signal handlers: {}", e);
            std::process::exit(EXIT_SETUP_FAILED);
        }
    };

    let state = match ServiceState::from_config(service_config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("error creating server state: {}", e);
            std::process::exit(EXIT_SETUP_FAILED);
        }
    };

    let http_config = http::Config::new(service_config.listen_addr, log_level);
    let mut http_handle = tokio::spawn(async move {
        tracing::info!("Starting gateway server on {}", http_config.listen_addr);
        http::run(http_config, state, stop_rx).await
    });

    tokio::select! {
        _ = waiter => {}
        result = &mut http_handle => {
            // the server stopped before any shutdown signal
            match result {
                Ok(Ok(())) => tracing::warn!("Gateway server exited"),
                Ok(Err(e)) => tracing::error!("Gateway server error: {}", e),
                Err(e) => tracing::error!("Gateway server task failed: {}", e),
            }
            std::process::exit(EXIT_SERVER_FAILED);
        }
    }

    match timeout(FINAL_SHUTDOWN_TIMEOUT, http_handle).await {
        Ok(Ok(Err(e))) => tracing::error!("Gateway server error during shutdown: {}", e),
        Ok(_) => tracing::info!("Gateway shutdown complete"),
        Err(_) => {
            tracing::error!(
                "Failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            );
            std::process::exit(EXIT_SHUTDOWN_TIMEOUT);
        }
    }
}
