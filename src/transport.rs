//! HTTP boundary.
//!
//! The batcher and the service wrappers never touch the network directly;
//! they go through [`Transport`] (plain GET/POST against caller-supplied
//! URLs) or [`AuthSession`] (an authenticated service call). Tests substitute
//! stubs for both.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Plain HTTP against caller-supplied URLs. Connection pooling, TLS and
/// timeouts live behind this seam; no retries are performed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, content_type: &str, body: String) -> Result<HttpResponse>;
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Performs an authenticated call against a service endpoint and returns the
/// raw response body. Credentials and session lifetime are its problem.
#[async_trait]
pub trait AuthSession: Send + Sync {
    async fn request(&self, service_url: &str, action: &str, body: String) -> Result<String>;
}

/// [`Transport`] backed by a shared reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::default())
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Self {
            client: builder.build().unwrap_or_default(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, content_type: &str, body: String) -> Result<HttpResponse> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
