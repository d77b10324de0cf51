// ── Channel bridge ──
//
// Forwards the transport's broadcast stream into the dashboard queue,
// translating raw channel events into typed dashboard events.

use std::sync::Arc;

use netdash_api::{ChannelEvent, RealtimeHandle};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::event::{DashboardEvent, REQUEST_DEVICE_STATUS};

/// The parts of a real-time channel the bridge needs.
pub trait EventChannel: Send + Sync + 'static {
    fn subscribe(&self) -> broadcast::Receiver<Arc<ChannelEvent>>;

    fn emit(&self, name: &str, payload: Value);
}

impl EventChannel for RealtimeHandle {
    fn subscribe(&self) -> broadcast::Receiver<Arc<ChannelEvent>> {
        RealtimeHandle::subscribe(self)
    }

    fn emit(&self, name: &str, payload: Value) {
        RealtimeHandle::emit(self, name, payload);
    }
}

/// Run until the channel closes, the dashboard queue closes, or `cancel`
/// fires. With `request_snapshot`, every (re)connect asks the server for a
/// full device snapshot.
pub async fn bridge_channel<C: EventChannel>(
    channel: Arc<C>,
    tx: mpsc::Sender<DashboardEvent>,
    request_snapshot: bool,
    cancel: CancellationToken,
) {
    let mut events = channel.subscribe();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = events.recv() => {
                match result {
                    Ok(event) => {
                        let Some(mapped) = DashboardEvent::from_channel(&event) else {
                            continue;
                        };
                        let connected = matches!(mapped, DashboardEvent::Connected);
                        if tx.send(mapped).await.is_err() {
                            debug!("dashboard queue closed, stopping bridge");
                            break;
                        }
                        if connected && request_snapshot {
                            channel.emit(REQUEST_DEVICE_STATUS, Value::Null);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event bridge lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("channel closed, stopping bridge");
                        break;
                    }
                }
            }
        }
    }
}
