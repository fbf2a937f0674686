use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub health_check_path: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("service ( {0} ) was not found")]
    NotFound(String),

    #[error("registry returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("invalid registry url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct RegistryClient {
    client: Client,
    registry_url: String,
}

impl RegistryClient {
    pub fn new(registry_url: &str) -> Self {
        Self::with_client(Client::new(), registry_url)
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, TLS).
    pub fn with_client(client: Client, registry_url: &str) -> Self {
        Self {
            client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
        }
    }

    /// Register a service behind a path-prefix route.
    ///
    /// `path` is recorded as routing tags for an edge proxy; `health` is the
    /// health check path (or absolute URL) the registry probes.
    pub async fn register(
        &self,
        id: &str,
        name: &str,
        host: &str,
        port: u16,
        path: &str,
        health: &str,
    ) -> Result<(), ClientError> {
        self.register_instance(&Registration {
            id: id.to_string(),
            name: name.to_string(),
            address: host.to_string(),
            port,
            health_check_path: health.to_string(),
            tags: vec![
                format!("traefik.backend={}", name),
                format!("traefik.frontend.rule=PathPrefix:{}", path),
            ],
        })
        .await
    }

    pub async fn register_instance(&self, registration: &Registration) -> Result<(), ClientError> {
        let resp = self
            .client
            .put(self.endpoint(&["v1", "agent", "service", "register"])?)
            .json(registration)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    pub async fn deregister(&self, id: &str) -> Result<(), ClientError> {
        let resp = self
            .client
            .put(self.endpoint(&["v1", "agent", "service", "deregister", id])?)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    /// Passing instances of `service`; an empty `tag` matches all.
    pub async fn service(&self, service: &str, tag: &str) -> Result<Vec<ServiceEntry>, ClientError> {
        let mut req = self
            .client
            .get(self.endpoint(&["v1", "health", "service", service])?);
        if !tag.is_empty() {
            req = req.query(&[("tag", tag)]);
        }

        let resp = req.send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(service.to_string()));
        }

        let entries: Vec<ServiceEntry> = check(resp).await?.json().await?;
        if entries.is_empty() {
            return Err(ClientError::NotFound(service.to_string()));
        }
        Ok(entries)
    }
}

impl RegistryClient {
    /// Registry URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.registry_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.registry_url)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.registry_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);
    Err(ClientError::Api { status, message })
}
