//! Engine.IO v4 / Socket.IO v5 text-frame codec.
//!
//! Only the subset a read-mostly dashboard needs: the Engine.IO handshake
//! and heartbeat, default-namespace connect/disconnect, and event frames.
//! Binary attachments are not supported.

use serde_json::Value;

use crate::error::Error;

/// One decoded WebSocket text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Engine.IO `0`: handshake with session parameters.
    Open(Value),
    /// Engine.IO `1`: server is closing the transport.
    Close,
    /// Engine.IO `2`: heartbeat, must be answered with a pong.
    Ping,
    /// Engine.IO `3`.
    Pong,
    /// Engine.IO `6`.
    Noop,
    /// Engine.IO `4` carrying a Socket.IO packet.
    Socket(SocketPacket),
}

/// Socket.IO packet inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// `0`: namespace connect acknowledged.
    Connect { namespace: String },
    /// `1`: namespace disconnected by the server.
    Disconnect { namespace: String },
    /// `2`: named event with its first argument (`null` when absent).
    Event {
        namespace: String,
        name: String,
        payload: Value,
    },
    /// `4`: namespace connect refused.
    ConnectError { namespace: String, data: Value },
    /// Acks and binary packets the dashboard never acts on.
    Other { kind: char },
}

impl SocketPacket {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Connect { namespace }
            | Self::Disconnect { namespace }
            | Self::Event { namespace, .. }
            | Self::ConnectError { namespace, .. } => Some(namespace),
            Self::Other { .. } => None,
        }
    }

    pub fn is_default_namespace(&self) -> bool {
        self.namespace().is_none_or(|ns| ns == "/")
    }
}

/// Decode one text frame.
pub fn decode(text: &str) -> Result<Frame, Error> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Error::Protocol("empty frame".into()))?;
    let rest = chars.as_str();

    match kind {
        '0' => {
            let handshake = serde_json::from_str(rest)
                .map_err(|e| Error::Protocol(format!("bad open packet: {e}")))?;
            Ok(Frame::Open(handshake))
        }
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping),
        '3' => Ok(Frame::Pong),
        '4' => decode_socket_packet(rest).map(Frame::Socket),
        '6' => Ok(Frame::Noop),
        other => Err(Error::Protocol(format!("unknown engine packet type '{other}'"))),
    }
}

fn decode_socket_packet(text: &str) -> Result<SocketPacket, Error> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Error::Protocol("empty socket packet".into()))?;
    let (namespace, body) = split_namespace(chars.as_str());

    match kind {
        '0' => Ok(SocketPacket::Connect { namespace }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            // Optional ack id precedes the JSON array.
            let json = body.trim_start_matches(|c: char| c.is_ascii_digit());
            let args: Value = serde_json::from_str(json)
                .map_err(|e| Error::Protocol(format!("bad event packet: {e}")))?;
            let Value::Array(mut args) = args else {
                return Err(Error::Protocol("event packet is not an array".into()));
            };
            if args.is_empty() {
                return Err(Error::Protocol("event packet has no name".into()));
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                other => {
                    return Err(Error::Protocol(format!("event name is not a string: {other}")));
                }
            };
            let payload = if args.is_empty() {
                Value::Null
            } else {
                args.swap_remove(0)
            };
            Ok(SocketPacket::Event {
                namespace,
                name,
                payload,
            })
        }
        '4' => {
            let data = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_owned()))
            };
            Ok(SocketPacket::ConnectError { namespace, data })
        }
        other => Ok(SocketPacket::Other { kind: other }),
    }
}

/// Split an optional `/namespace,` prefix from the packet body.
fn split_namespace(text: &str) -> (String, &str) {
    if let Some(stripped) = text.strip_prefix('/') {
        match stripped.split_once(',') {
            Some((ns, rest)) => (format!("/{ns}"), rest),
            None => (format!("/{stripped}"), ""),
        }
    } else {
        ("/".to_owned(), text)
    }
}

// ── Encoders ─────────────────────────────────────────────────────────

/// Default-namespace connect request, sent after the Engine.IO handshake.
pub fn encode_connect() -> String {
    "40".to_owned()
}

/// Heartbeat reply.
pub fn encode_pong() -> String {
    "3".to_owned()
}

/// Default-namespace event emit.
pub fn encode_event(name: &str, payload: &Value) -> String {
    let args = if payload.is_null() {
        Value::Array(vec![Value::String(name.to_owned())])
    } else {
        Value::Array(vec![Value::String(name.to_owned()), payload.clone()])
    };
    format!("42{args}")
}
