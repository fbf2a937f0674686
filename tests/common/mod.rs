//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use service_registry::config::RegistryConfig;
use service_registry::{Agent, Registration, Shutdown};

/// A programmable mock backend and the number of requests it has accepted.
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn health_url(&self) -> String {
        format!("http://{}/health", self.addr)
    }
}

/// Start a mock backend whose status comes from `f` on every request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = u16> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let f = Arc::new(f);

    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let f = f.clone();
                    tokio::spawn(async move {
                        let status = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            204 => "204 No Content",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_text
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, hits }
}

/// Mock backend that always answers with `status`.
pub async fn start_mock_backend(status: u16) -> MockBackend {
    start_programmable_backend(move || async move { status }).await
}

/// Registry config with a two second probe interval and one second timeout.
pub fn fast_config() -> RegistryConfig {
    let mut config = RegistryConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.health_check.interval_secs = 2;
    config.health_check.timeout_secs = 1;
    config
}

pub fn agent(config: &RegistryConfig) -> (Agent, Shutdown) {
    let shutdown = Shutdown::new();
    let agent = Agent::new(config, shutdown.clone()).unwrap();
    (agent, shutdown)
}

pub fn registration(id: &str, name: &str, backend: &MockBackend, tags: &[&str]) -> Registration {
    Registration {
        id: id.into(),
        name: name.into(),
        address: backend.addr.ip().to_string(),
        port: backend.addr.port(),
        health_check_path: "/health".into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Poll `condition` every 50ms until it holds or `timeout` passes.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
