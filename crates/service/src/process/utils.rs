use std::io;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long in-flight downloads get after SIGTERM before the server
///  stops accepting connections
pub const SIGTERM_DRAIN_PERIOD: Duration = Duration::from_secs(10);

/// The signal that asked the gateway to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

pub struct ShutdownBlocker {
    /// resolves once the stop has been broadcast
    pub waiter: JoinHandle<StopSignal>,
    /// fires when the server should begin its graceful shutdown
    pub stop_rx: watch::Receiver<()>,
}

/// Listen for SIGINT and SIGTERM. SIGINT stops at once, SIGTERM after
///  `drain`.
pub fn shutdown_blocker(drain: Duration) -> io::Result<ShutdownBlocker> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let (stop_tx, stop_rx) = watch::channel(());

    let waiter = tokio::spawn(async move {
        let received = tokio::select! {
            _ = sigint.recv() => StopSignal::Interrupt,
            _ = sigterm.recv() => StopSignal::Terminate,
        };
        tracing::info!(signal = ?received, "stop requested");

        if received == StopSignal::Terminate {
            tracing::debug!("draining for {}s before shutdown", drain.as_secs());
            tokio::time::sleep(drain).await;
        }

        let _ = stop_tx.send(());
        received
    });

    Ok(ShutdownBlocker { waiter, stop_rx })
}

/// Route panics through `tracing` so they land in the same log stream
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| {
        let thread = std::thread::current();
        let thread = thread.name().unwrap_or("<unnamed>");
        match panic.location() {
            Some(loc) => tracing::error!(
                message = %panic,
                thread,
                panic.file = loc.file(),
                panic.line = loc.line(),
            ),
            None => tracing::error!(message = %panic, thread),
        }
    }));
}

pub fn report_build_info() {
    let build = common::prelude::build_info();
    tracing::info!(
        version = build.version,
        profile = build.build_profile,
        features = ?build.build_features,
        "dagway starting up"
    );
}
