// ── Submit transport seam ──

use std::fmt;
use std::future::Future;

use netdash_api::{DhcpClient, DhcpRequest, SubmitReceipt};
use tracing::warn;

use crate::form::GENERIC_FAILURE;

/// A failed submission, reduced to what the operator gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    /// Server-supplied error text, if any.
    pub message: Option<String>,
    /// Set when the request gave up waiting; the configured limit in seconds.
    pub timeout_secs: Option<u64>,
}

impl SubmitFailure {
    pub fn new(message: Option<String>) -> Self {
        Self {
            message,
            timeout_secs: None,
        }
    }

    /// The server's message, else the generic failure text.
    pub fn display_message(&self) -> &str {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_FAILURE)
    }
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_message())
    }
}

impl From<netdash_api::Error> for SubmitFailure {
    fn from(err: netdash_api::Error) -> Self {
        warn!(error = %err, "DHCP submission failed");
        let timeout_secs = match &err {
            netdash_api::Error::Timeout { timeout_secs } => Some(*timeout_secs),
            _ => None,
        };
        Self {
            message: err.server_message().map(str::to_owned),
            timeout_secs,
        }
    }
}

/// Sends a DHCP configuration to the server.
pub trait Submitter: Send + Sync + 'static {
    fn submit(
        &self,
        request: DhcpRequest,
    ) -> impl Future<Output = Result<SubmitReceipt, SubmitFailure>> + Send;
}

impl Submitter for DhcpClient {
    async fn submit(&self, request: DhcpRequest) -> Result<SubmitReceipt, SubmitFailure> {
        DhcpClient::submit(self, &request)
            .await
            .map_err(SubmitFailure::from)
    }
}
