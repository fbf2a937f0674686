//! HTTP health probes.
//!
//! One GET per call, bounded by the configured timeout. Any failure is a
//! `ProbeError`; callers turn it into a status, never propagate it.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio::time;
use url::Url;

use crate::config::HealthCheckConfig;

const USER_AGENT: &str = "service-registry-health-check";

/// Why a probe did not pass.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unhealthy status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),
}

/// Issues health check requests.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(config: &HealthCheckConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(config.tls_skip_verify)
            .timeout(config.timeout())
            // Health endpoints often close after each response.
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    /// Probe `url` once. Returns the 2xx status code on success.
    pub async fn probe(&self, url: &Url) -> Result<u16, ProbeError> {
        let request = self.client.get(url.clone()).send();

        match time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => {
                let status = response.status();
                if status.is_success() {
                    Ok(status.as_u16())
                } else {
                    Err(ProbeError::Status(status.as_u16()))
                }
            }
            Ok(Err(e)) if e.is_timeout() => Err(ProbeError::Timeout(self.timeout)),
            Ok(Err(e)) if e.is_connect() => Err(ProbeError::Connect(e.to_string())),
            Ok(Err(e)) => Err(ProbeError::Request(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}

/// Human-readable probe outcome stored on the instance.
pub fn describe(url: &Url, result: &Result<u16, ProbeError>) -> String {
    match result {
        Ok(code) => format!("HTTP GET {url}: {code} OK"),
        Err(e) => format!("HTTP GET {url}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn serve_once(status_line: &'static str, delay: Duration) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        Url::parse(&format!("http://{addr}/health")).unwrap()
    }

    fn prober() -> HttpProber {
        HttpProber::new(&HealthCheckConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_success() {
        let url = serve_once("200 OK", Duration::ZERO).await;
        assert_eq!(prober().probe(&url).await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let url = serve_once("503 Service Unavailable", Duration::ZERO).await;
        let err = prober().probe(&url).await.unwrap_err();
        assert!(matches!(err, ProbeError::Status(503)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let url = serve_once("200 OK", Duration::from_secs(3)).await;
        let err = prober().probe(&url).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nothing listens on.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let url = Url::parse(&format!("http://{addr}/health")).unwrap();
        let err = prober().probe(&url).await.unwrap_err();
        assert!(matches!(err, ProbeError::Connect(_) | ProbeError::Request(_)));
    }

    async fn serve_tls() -> Url {
        use tokio::io::AsyncReadExt;
        use tokio_rustls::rustls::crypto::ring;
        use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
        use tokio_rustls::rustls::ServerConfig;
        use tokio_rustls::TlsAcceptor;

        let certified =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
                .unwrap();
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));
        let config = ServerConfig::builder_with_provider(std::sync::Arc::new(ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![certified.cert.der().clone()], key)
            .unwrap();
        let acceptor = TlsAcceptor::from(std::sync::Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    // Handshake fails when the client verifies the chain.
                    let Ok(mut tls) = acceptor.accept(socket).await else {
                        return;
                    };
                    let mut buf = [0u8; 1024];
                    let _ = tls.read(&mut buf).await;
                    let _ = tls
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .await;
                    let _ = tls.shutdown().await;
                });
            }
        });
        Url::parse(&format!("https://{addr}/health")).unwrap()
    }

    #[tokio::test]
    async fn test_self_signed_https_passes_when_verification_skipped() {
        let url = serve_tls().await;
        let config = HealthCheckConfig {
            tls_skip_verify: true,
            ..HealthCheckConfig::default()
        };
        let prober = HttpProber::new(&config).unwrap();
        assert_eq!(prober.probe(&url).await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_self_signed_https_fails_when_verified() {
        let url = serve_tls().await;
        let config = HealthCheckConfig {
            tls_skip_verify: false,
            ..HealthCheckConfig::default()
        };
        let prober = HttpProber::new(&config).unwrap();
        let err = prober.probe(&url).await.unwrap_err();
        assert!(matches!(err, ProbeError::Connect(_) | ProbeError::Request(_)), "{err}");
    }

    #[test]
    fn test_describe() {
        let url = Url::parse("http://10.0.0.1:8080/health").unwrap();
        assert_eq!(describe(&url, &Ok(200)), "HTTP GET http://10.0.0.1:8080/health: 200 OK");
        assert!(describe(&url, &Err(ProbeError::Status(500))).ends_with("unhealthy status 500"));
    }
}
