// Server module entry
// Listener setup, connection serving and graceful shutdown

pub mod accept;
pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::AppState;
use crate::error::HostError;
use crate::logger;

pub use listener::create_reusable_listener;

/// Bind, serve until SIGTERM/SIGINT, then drain.
///
/// Connection tasks use `spawn_local`, so this runs inside a `LocalSet`.
pub async fn serve(state: Arc<AppState>) -> Result<(), HostError> {
    let addr = state.config.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;
    let bound = listener.local_addr()?;

    logger::log_server_start(
        &bound,
        &state.config,
        &state.functions.names(),
        &state.base_path,
    );

    signal::start_signal_handler(Arc::clone(&state.signals));

    let local = tokio::task::LocalSet::new();
    local
        .run_until(accept::run_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
        ))
        .await;
    Ok(())
}
