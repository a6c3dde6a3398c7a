use std::time::Duration;

use tracing::{error, info};

use crate::shutdown::ShutdownKernel;

/// Routes SIGINT and SIGTERM to `kernel.shutdown()`. Platforms without
/// POSIX signals route their equivalent (Windows console control events,
/// via `tokio::signal::ctrl_c`) to the same entry point.
pub fn install(kernel: &'static ShutdownKernel, deadline: Duration) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("received shutdown signal");
        if let Err(e) = kernel.shutdown(deadline).await {
            error!(error = %e, "shutdown did not complete cleanly");
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
