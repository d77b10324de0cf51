// netdash-api: Async wire clients for the operations server (submit endpoint + event channel)

pub mod dhcp;
pub mod error;
pub mod realtime;
pub mod socketio;
pub mod transport;

pub use dhcp::{DhcpClient, DhcpRequest, SubmitReceipt};
pub use error::Error;
pub use realtime::{ChannelEvent, RealtimeHandle, ReconnectConfig};
pub use transport::{TlsMode, TransportConfig, websocket_url};
