// ── Runtime connection configuration ──
//
// Describes *how* to reach the operations server. Never touches disk:
// the CLI resolves a profile into a `DashboardConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use netdash_api::{DhcpClient, ReconnectConfig, TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;

pub const DEFAULT_SOCKET_PATH: &str = "/socket.io/";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab servers).
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Server base URL (e.g., `http://10.1.1.5:5000`).
    pub server: Url,
    /// Socket.IO endpoint path on the server.
    pub socket_path: String,
    /// Whether to open the real-time channel at all.
    pub realtime: bool,
    /// Ask for a full device snapshot after every (re)connect.
    pub request_snapshot: bool,
    pub tls: TlsVerification,
    /// HTTP request timeout.
    pub timeout: Duration,
    pub reconnect: ReconnectConfig,
}

impl DashboardConfig {
    /// Defaults for everything except the server URL.
    pub fn new(server: Url) -> Self {
        Self {
            server,
            socket_path: DEFAULT_SOCKET_PATH.to_owned(),
            realtime: true,
            request_snapshot: true,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    pub fn websocket_url(&self) -> Result<Url, CoreError> {
        Ok(netdash_api::websocket_url(&self.server, &self.socket_path)?)
    }

    pub fn dhcp_client(&self) -> Result<DhcpClient, CoreError> {
        Ok(DhcpClient::new(self.server.clone(), &self.transport())?)
    }
}
