use {super::*, tokio::signal::ctrl_c};

/// Cancelled on the first SIGINT or SIGTERM.
pub(crate) fn setup_signal_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c() => info!("Received shutdown signal (Ctrl-C / SIGINT)"),
                        _ = sigterm.recv() => info!("Received shutdown signal (SIGTERM)"),
                    }
                }
                Err(err) => {
                    warn!("Failed to install SIGTERM handler: {err}");
                    ctrl_c().await.ok();
                    info!("Received shutdown signal (Ctrl-C)");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c().await.ok();
            info!("Received shutdown signal (Ctrl-C)");
        }

        cancel_clone.cancel();
    });

    cancel
}
