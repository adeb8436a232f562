use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;
use url::Url;

use crate::args::DEFAULT_USER_AGENT;
use crate::classify::TransportErrorKind;
use crate::error::HttpError;

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

/// Unary POST primitive the dispatcher runs on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportErrorKind>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed (e.g. TLS
    /// backend initialization fails).
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportErrorKind> {
        let mut builder = self
            .client
            .post(request.url)
            .timeout(request.timeout)
            .body(request.body);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|err| error_kind(&err))?;
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) if err.is_timeout() => return Err(TransportErrorKind::Timeout),
            Err(err) => {
                warn!("Failed to read response body: {}", err);
                String::new()
            }
        };
        Ok(TransportReply { status, body })
    }
}

fn error_kind(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    }
}
