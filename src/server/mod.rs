// Server module entry point
// Listener setup, accept loop, per-connection handling, signal handling

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use listener::create_listener;

/// How long to wait for in-flight connections after shutdown is requested
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

/// Accept loop: serve connections until a shutdown signal arrives.
pub async fn run(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<signal::ShutdownSignal>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notify.notified() => {
                break;
            }
        }

        // Covers a signal delivered while an accept was resolving
        if shutdown.is_requested() {
            break;
        }
    }

    logger::log_shutdown();
    drop(listener);
    drain_connections(&active_connections).await;
    Ok(())
}

/// Wait for active connections to finish, bounded by `SHUTDOWN_GRACE`.
async fn drain_connections(active_connections: &Arc<AtomicUsize>) {
    let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;

    while active_connections.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown grace period elapsed with {} connection(s) still active",
                active_connections.load(Ordering::SeqCst)
            ));
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
}
