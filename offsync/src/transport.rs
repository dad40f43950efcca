//! Network transport boundary.
//!
//! Strategy executors and the replay worker talk to the network through
//! [`NetworkTransport`], which keeps one distinction sharp: an `Err` means
//! the server was never reached (connectivity failure), while an `Ok`
//! response may still carry a 4xx/5xx status (application error). The two
//! are handled very differently upstream — connectivity failures degrade
//! to cache or get queued, application errors propagate verbatim.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use offsync_config::{build_http_client, HttpClientParams, HttpConfig};
use offsync_store::{CachedResponse, CapturedRequest, Method};

#[derive(Error, Debug)]
pub enum TransportError {
    /// Nothing reached the server: DNS failure, refused connection,
    /// timeout, dropped link.
    #[error("Connectivity failure: {0}")]
    Connectivity(String),
    /// The request could not be constructed or sent as given.
    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, TransportError::Connectivity(_))
    }
}

#[async_trait]
pub trait NetworkTransport: Send + Sync {
    /// Send a request. `Ok` responses may carry any HTTP status; `Err`
    /// means the server was never reached.
    async fn send(
        &self,
        request: &CapturedRequest,
    ) -> Result<CachedResponse, TransportError>;
}

pub type AbstractTransport = Arc<dyn NetworkTransport>;

/// reqwest-backed transport. Timeouts come from the client configuration;
/// the strategies add no deadlines of their own.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(HttpClientParams::from_config(config))?;
        Ok(Self::new(client))
    }

    fn reqwest_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

#[async_trait]
impl NetworkTransport for HttpTransport {
    async fn send(
        &self,
        request: &CapturedRequest,
    ) -> Result<CachedResponse, TransportError> {
        let mut builder = self
            .client
            .request(Self::reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::Malformed(e.to_string())
            } else {
                TransportError::Connectivity(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Connectivity(e.to_string()))?
            .to_vec();

        Ok(CachedResponse {
            status,
            headers,
            body,
        })
    }
}
