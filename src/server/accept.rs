// Server loop module
// Accepts connections until shutdown, then waits for in-flight ones to drain

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept loop for the function host.
///
/// Returns once shutdown has been requested and the active connections have
/// finished or `performance.shutdown_timeout` has passed.
pub async fn run_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
) {
    let signals = Arc::clone(&state.signals);

    while !signals.is_shutdown_requested() {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = signals.shutdown.notified() => {}
        }
    }

    // Stop accepting before draining
    drop(listener);

    let timeout = Duration::from_secs(state.config.performance.shutdown_timeout);
    let remaining = drain_connections(&active_connections, timeout).await;
    if remaining == 0 {
        logger::log_info("All connections closed, host stopped");
    } else {
        logger::log_warning(&format!(
            "Shutdown timeout reached with {remaining} connection(s) still open"
        ));
    }
}

/// Wait until the counter reaches zero or `timeout` elapses; returns what is left
async fn drain_connections(active_connections: &AtomicUsize, timeout: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 || tokio::time::Instant::now() >= deadline {
            return active;
        }
        logger::log_debug(&format!("Waiting for {active} connection(s) to finish"));
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::function::FunctionRegistry;
    use crate::server::listener::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_drain_returns_immediately_when_idle() {
        let counter = AtomicUsize::new(0);
        assert_eq!(drain_connections(&counter, Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_timeout() {
        let counter = AtomicUsize::new(2);
        let left = drain_connections(&counter, Duration::from_millis(120)).await;
        assert_eq!(left, 2);
    }

    #[tokio::test]
    async fn test_serves_function_over_tcp_and_shuts_down() {
        let mut cfg = Config::load_from("does/not/exist/fnhost").unwrap();
        cfg.logging.access_log = false;
        cfg.performance.shutdown_timeout = 2;
        let state = Arc::new(AppState::new(&cfg, FunctionRegistry::with_builtins()));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(run_server_loop(
                    listener,
                    Arc::clone(&state),
                    Arc::new(AtomicUsize::new(0)),
                ));

                let body = r#"{"name":"ok"}"#;
                let request = format!(
                    "POST /.netlify/functions/save HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
                stream.write_all(request.as_bytes()).await.unwrap();
                let mut response = String::new();
                stream.read_to_string(&mut response).await.unwrap();

                assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
                assert!(response.ends_with(
                    r#"{"ok":true,"message":"Received POST","data":{"name":"ok"}}"#
                ));

                state.signals.request_shutdown();
                tokio::time::timeout(Duration::from_secs(5), server)
                    .await
                    .unwrap()
                    .unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_keep_alive_connection() {
        let mut cfg = Config::load_from("does/not/exist/fnhost").unwrap();
        cfg.logging.access_log = false;
        cfg.performance.shutdown_timeout = 10;
        let state = Arc::new(AppState::new(&cfg, FunctionRegistry::with_builtins()));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let active = Arc::new(AtomicUsize::new(0));

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(run_server_loop(
                    listener,
                    Arc::clone(&state),
                    Arc::clone(&active),
                ));

                let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
                let request =
                    format!("GET /.netlify/functions/save HTTP/1.1\r\nHost: {addr}\r\n\r\n");
                stream.write_all(request.as_bytes()).await.unwrap();

                // Read one response and leave the connection open
                let mut received = Vec::new();
                let mut buf = [0u8; 1024];
                while !received.ends_with(br#"["GET","POST"]}"#) {
                    let n = stream.read(&mut buf).await.unwrap();
                    assert!(n > 0, "connection closed before the response was complete");
                    received.extend_from_slice(&buf[..n]);
                }
                assert!(received.starts_with(b"HTTP/1.1 200 OK"));
                assert_eq!(active.load(Ordering::SeqCst), 1);

                let started = std::time::Instant::now();
                state.signals.request_shutdown();
                tokio::time::timeout(Duration::from_secs(2), server)
                    .await
                    .unwrap()
                    .unwrap();
                assert!(started.elapsed() < Duration::from_secs(2));
                assert_eq!(active.load(Ordering::SeqCst), 0);

                // Server side hung up
                assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
            })
            .await;
    }
}
