//! Socket.IO event channel with auto-reconnect.
//!
//! Connects to the dashboard server's Socket.IO endpoint over a plain
//! WebSocket transport and streams [`ChannelEvent`]s through a
//! [`tokio::sync::broadcast`] channel. Handles the Engine.IO heartbeat and
//! reconnection with exponential backoff + jitter automatically.
//!
//! # Example
//!
//! ```rust,ignore
//! use netdash_api::realtime::{ChannelEvent, RealtimeHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket")?;
//!
//! let handle = RealtimeHandle::connect(ws_url, ReconnectConfig::default(), cancel.clone());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     if let ChannelEvent::Message { name, payload } = &*event {
//!         println!("{name}: {payload}");
//!     }
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::socketio::{self, Frame, SocketPacket};

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── ChannelEvent ─────────────────────────────────────────────────────

/// Something observed on the real-time channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The Socket.IO session is established (namespace connect acknowledged).
    Connected,
    /// A previously established session ended.
    Disconnected,
    /// A server-pushed event with its first argument.
    Message { name: String, payload: Value },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for channel reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive failed attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── RealtimeHandle ───────────────────────────────────────────────────

#[derive(Debug)]
struct Outbound {
    name: String,
    payload: Value,
}

/// Handle to a running real-time channel.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to tear down the background task.
pub struct RealtimeHandle {
    event_tx: broadcast::Sender<Arc<ChannelEvent>>,
    /// Receiver created before the background task starts, so the first
    /// subscriber never misses the initial `Connected`.
    first_rx: Mutex<Option<broadcast::Receiver<Arc<ChannelEvent>>>>,
    emit_tx: mpsc::UnboundedSender<Outbound>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Spawn the connect/reconnect loop and return immediately.
    ///
    /// Must be called from within a Tokio runtime. The first connection
    /// attempt happens asynchronously.
    pub fn connect(ws_url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (event_tx, first_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (emit_tx, emit_rx) = mpsc::unbounded_channel();

        let task_tx = event_tx.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(ws_url, task_tx, emit_rx, reconnect, task_cancel).await;
        });

        Self {
            event_tx,
            first_rx: Mutex::new(Some(first_rx)),
            emit_tx,
            cancel,
        }
    }

    /// Get a broadcast receiver for the event stream.
    ///
    /// The first call returns a receiver that has seen every event since
    /// [`connect`](Self::connect); later calls only see new events. A
    /// consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ChannelEvent>> {
        if let Ok(mut first) = self.first_rx.lock() {
            if let Some(rx) = first.take() {
                return rx;
            }
        }
        self.event_tx.subscribe()
    }

    /// Queue a client-to-server event.
    ///
    /// Delivered on the current session; emits queued while no session is
    /// established are dropped when the next session starts.
    pub fn emit(&self, name: impl Into<String>, payload: Value) {
        let outbound = Outbound {
            name: name.into(),
            payload,
        };
        if self.emit_tx.send(outbound).is_err() {
            tracing::debug!("real-time loop has exited, emit dropped");
        }
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the background task has stopped or been told to stop,
    /// including after the reconnection limit is reached.
    pub async fn closed(&self) {
        self.cancel.cancelled().await;
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on end, backoff → reconnect.
async fn ws_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<Arc<ChannelEvent>>,
    mut emit_rx: mpsc::UnboundedReceiver<Outbound>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let mut session = Session::default();

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = session.run(&ws_url, &event_tx, &mut emit_rx, &cancel) => result,
        };

        if session.connected {
            // Ignore send errors -- just means no active subscribers right now
            let _ = event_tx.send(Arc::new(ChannelEvent::Disconnected));
            attempt = 0;
        }

        if cancel.is_cancelled() {
            break;
        }

        match result {
            Ok(()) => tracing::info!("real-time session ended, reconnecting"),
            Err(e) if e.is_transient() => {
                tracing::info!(error = %e, attempt, "real-time channel dropped");
            }
            Err(e) => tracing::warn!(error = %e, attempt, "real-time channel error"),
        }

        if let Some(max) = reconnect.max_retries {
            if attempt >= max {
                tracing::error!(
                    max_retries = max,
                    "real-time reconnection limit reached, giving up"
                );
                break;
            }
        }

        let delay = calculate_backoff(attempt, &reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "Waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt = attempt.saturating_add(1);
    }

    // Marks the handle closed for anyone waiting on it.
    cancel.cancel();
    tracing::debug!("real-time loop exiting");
}

// ── Single session lifecycle ─────────────────────────────────────────

/// What to do after handling one inbound frame.
#[derive(Debug, PartialEq)]
enum Step {
    Continue,
    Reply(String),
    End,
}

#[derive(Debug, Default)]
struct Session {
    /// Set once the server acknowledged the namespace connect.
    connected: bool,
}

impl Session {
    /// Establish one WebSocket connection and pump frames until it drops.
    async fn run(
        &mut self,
        url: &Url,
        event_tx: &broadcast::Sender<Arc<ChannelEvent>>,
        emit_rx: &mut mpsc::UnboundedReceiver<Outbound>,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        while let Ok(stale) = emit_rx.try_recv() {
            tracing::debug!(event = %stale.name, "dropping emit queued while disconnected");
        }

        tracing::info!(url = %url, "Connecting to real-time channel");

        let uri: tungstenite::http::Uri = url.as_str().parse().map_err(
            |e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()),
        )?;

        let (ws_stream, _response) =
            tokio_tungstenite::connect_async(ClientRequestBuilder::new(uri))
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::debug!("WebSocket open, waiting for Engine.IO handshake");

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let _ = write.send(tungstenite::Message::Close(None)).await;
                    return Ok(());
                }
                Some(outbound) = emit_rx.recv(), if self.connected => {
                    tracing::debug!(event = %outbound.name, "emitting");
                    let text = socketio::encode_event(&outbound.name, &outbound.payload);
                    write
                        .send(tungstenite::Message::text(text))
                        .await
                        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            match self.handle_text(text.as_str(), event_tx)? {
                                Step::Continue => {}
                                Step::Reply(reply) => {
                                    write
                                        .send(tungstenite::Message::text(reply))
                                        .await
                                        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                                }
                                Step::End => return Ok(()),
                            }
                        }
                        Some(Ok(tungstenite::Message::Close(frame))) => {
                            return match frame {
                                Some(cf) if cf.code != CloseCode::Normal => {
                                    Err(Error::WebSocketClosed {
                                        code: u16::from(cf.code),
                                        reason: cf.reason.as_str().to_owned(),
                                    })
                                }
                                _ => {
                                    tracing::info!("WebSocket closed normally");
                                    Ok(())
                                }
                            };
                        }
                        Some(Err(e)) => {
                            return Err(Error::WebSocketConnect(e.to_string()));
                        }
                        None => {
                            tracing::info!("WebSocket stream ended");
                            return Ok(());
                        }
                        _ => {
                            // Binary, Ping, Pong, Frame -- ignore
                        }
                    }
                }
            }
        }
    }

    /// Decode one text frame and publish whatever it carries.
    fn handle_text(
        &mut self,
        text: &str,
        event_tx: &broadcast::Sender<Arc<ChannelEvent>>,
    ) -> Result<Step, Error> {
        let frame = match socketio::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to parse channel frame");
                return Ok(Step::Continue);
            }
        };

        let packet = match frame {
            Frame::Open(handshake) => {
                tracing::debug!(sid = ?handshake.get("sid"), "Engine.IO handshake");
                return Ok(Step::Reply(socketio::encode_connect()));
            }
            Frame::Ping => return Ok(Step::Reply(socketio::encode_pong())),
            Frame::Close => return Ok(Step::End),
            Frame::Pong | Frame::Noop => return Ok(Step::Continue),
            Frame::Socket(packet) => packet,
        };

        if !packet.is_default_namespace() {
            tracing::trace!(namespace = ?packet.namespace(), "ignoring foreign namespace");
            return Ok(Step::Continue);
        }

        match packet {
            SocketPacket::Connect { .. } => {
                self.connected = true;
                tracing::info!("real-time channel connected");
                let _ = event_tx.send(Arc::new(ChannelEvent::Connected));
                Ok(Step::Continue)
            }
            SocketPacket::Disconnect { .. } => {
                tracing::info!("server closed the Socket.IO session");
                Ok(Step::End)
            }
            SocketPacket::Event { name, payload, .. } => {
                tracing::trace!(event = %name, "channel event");
                let _ = event_tx.send(Arc::new(ChannelEvent::Message { name, payload }));
                Ok(Step::Continue)
            }
            SocketPacket::ConnectError { data, .. } => Err(Error::WebSocketConnect(format!(
                "namespace connect refused: {data}"
            ))),
            SocketPacket::Other { kind } => {
                tracing::trace!(%kind, "ignoring socket packet");
                Ok(Step::Continue)
            }
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from many dashboards.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    // Jitter can push a huge max_delay past what Duration holds.
    Duration::try_from_secs_f64(with_jitter).unwrap_or(config.max_delay)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        assert!(
            d10 <= Duration::from_secs(13),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
        // Absurd attempt counts must not overflow.
        assert!(calculate_backoff(u32::MAX, &config) <= Duration::from_secs(13));
    }

    #[test]
    fn backoff_survives_huge_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(u64::MAX),
            max_retries: None,
        };
        for attempt in [0, 1, 64, 200, 1_000, u32::MAX] {
            let delay = calculate_backoff(attempt, &config);
            assert!(delay <= config.max_delay, "attempt {attempt}: {delay:?}");
        }
    }

    #[test]
    fn handshake_is_answered_with_namespace_connect() {
        let (tx, _rx) = broadcast::channel(16);
        let mut session = Session::default();
        let step = session
            .handle_text(r#"0{"sid":"s1","pingInterval":25000}"#, &tx)
            .unwrap();
        assert_eq!(step, Step::Reply("40".into()));
        assert!(!session.connected);
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let (tx, _rx) = broadcast::channel(16);
        let mut session = Session::default();
        assert_eq!(session.handle_text("2", &tx).unwrap(), Step::Reply("3".into()));
    }

    #[test]
    fn connect_ack_publishes_connected() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut session = Session::default();
        session.handle_text(r#"40{"sid":"abc"}"#, &tx).unwrap();
        assert!(session.connected);
        assert_eq!(*rx.try_recv().unwrap(), ChannelEvent::Connected);
    }

    #[test]
    fn event_frame_is_broadcast() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut session = Session::default();
        session
            .handle_text(r#"42["device_status_update",{"summary":{"online":3}}]"#, &tx)
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(
            *event,
            ChannelEvent::Message {
                name: "device_status_update".into(),
                payload: json!({"summary": {"online": 3}}),
            }
        );
    }

    #[test]
    fn foreign_namespace_events_are_ignored() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut session = Session::default();
        let step = session.handle_text(r#"42/admin,["x",{}]"#, &tx).unwrap();
        assert_eq!(step, Step::Continue);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn server_disconnect_and_close_end_session() {
        let (tx, _rx) = broadcast::channel(16);
        let mut session = Session::default();
        assert_eq!(session.handle_text("41", &tx).unwrap(), Step::End);
        assert_eq!(session.handle_text("1", &tx).unwrap(), Step::End);
    }

    #[test]
    fn connect_error_fails_session() {
        let (tx, _rx) = broadcast::channel(16);
        let mut session = Session::default();
        let result = session.handle_text(r#"44{"message":"nope"}"#, &tx);
        assert!(matches!(result, Err(Error::WebSocketConnect(_))));
    }

    #[test]
    fn malformed_frame_is_skipped() {
        let (tx, mut rx) = broadcast::channel::<Arc<ChannelEvent>>(16);
        let mut session = Session::default();
        assert_eq!(session.handle_text("42not json", &tx).unwrap(), Step::Continue);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn retry_limit_closes_handle() {
        let reconnect = ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            max_retries: Some(0),
        };
        let url = Url::parse("ws://127.0.0.1:1/socket.io/?EIO=4&transport=websocket").unwrap();
        let handle = RealtimeHandle::connect(url, reconnect, CancellationToken::new());
        tokio::time::timeout(Duration::from_secs(10), handle.closed())
            .await
            .unwrap();
    }
}
