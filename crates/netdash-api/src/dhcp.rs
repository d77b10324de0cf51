// DHCP configuration submit endpoint
//
// A single JSON POST: the server queues a configuration task and answers
// with the task id that later shows up on the event channel.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const SUBMIT_PATH: &str = "dhcp/submit";

/// Request body for `POST /dhcp/submit`.
///
/// Every field is sent as the raw string the operator typed; the server
/// owns normalization (comma-separated device ids, first DNS entry, etc.).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpRequest {
    pub device_ids: String,
    pub pool_name: String,
    pub network: String,
    pub mask: String,
    pub gateway: String,
    pub dns: String,
    pub domain: String,
    pub lease_days: String,
}

/// Successful submission: the server-assigned task id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub task_id: String,
}

/// The server sends task ids as strings or integers depending on the backend.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTaskId {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
struct SubmitResponse {
    task_id: RawTaskId,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the DHCP submit endpoint.
#[derive(Debug, Clone)]
pub struct DhcpClient {
    http: reqwest::Client,
    base_url: Url,
    /// Request timeout baked into `http`, when known.
    timeout: Option<Duration>,
}

impl DhcpClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: Some(transport.timeout),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: None,
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Timeouts become [`Error::Timeout`] when the configured limit is known.
    fn transport_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(limit) if err.is_timeout() => Error::Timeout {
                timeout_secs: limit.as_secs(),
            },
            _ => Error::Transport(err),
        }
    }

    fn submit_url(&self) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{SUBMIT_PATH}"))?)
    }

    /// Submit a DHCP configuration and return the queued task id.
    ///
    /// Non-2xx responses become [`Error::Rejected`], carrying the body's
    /// `error` string when the server sent JSON.
    pub async fn submit(&self, request: &DhcpRequest) -> Result<SubmitReceipt, Error> {
        let url = self.submit_url()?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .filter(|m| !m.is_empty());
            return Err(Error::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SubmitResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        let task_id = match parsed.task_id {
            RawTaskId::Text(s) => s,
            RawTaskId::Number(n) => n.to_string(),
        };
        Ok(SubmitReceipt { task_id })
    }
}
