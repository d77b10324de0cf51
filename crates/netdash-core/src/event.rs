// ── Dashboard events ──
//
// Everything the reconciliation loop reacts to, decoded and typed. Channel
// payloads are parsed here, once, so the reducers only see well-formed data.

use netdash_api::{ChannelEvent, SubmitReceipt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::form::DhcpForm;
use crate::model::device::RawSummary;
use crate::model::{Device, DeviceStatusUpdate, DeviceSummary, TaskUpdate};
use crate::submit::SubmitFailure;

pub const EVENT_DEVICE_STATUS: &str = "device_status_update";
pub const EVENT_TASK_STATUS: &str = "task_status_update";
pub const EVENT_SERVER_ERROR: &str = "error";
pub const EVENT_CONNECTION_STATUS: &str = "connection_status";
/// Outbound: ask the server to push a full device snapshot.
pub const REQUEST_DEVICE_STATUS: &str = "request_device_status";

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// The real-time channel could not be set up at all.
    ChannelUnavailable,
    Connected,
    Disconnected,
    DeviceStatus(DeviceStatusUpdate),
    TaskStatus(TaskUpdate),
    /// Server-side failure report pushed over the channel.
    ServerError { message: String },
    SubmitRequested(DhcpForm),
    SubmitFinished(Result<SubmitReceipt, SubmitFailure>),
}

impl DashboardEvent {
    /// Map a raw channel event. Returns `None` for events the dashboard does
    /// not act on and for payloads that fail to decode.
    pub fn from_channel(event: &ChannelEvent) -> Option<Self> {
        match event {
            ChannelEvent::Connected => Some(Self::Connected),
            ChannelEvent::Disconnected => Some(Self::Disconnected),
            ChannelEvent::Message { name, payload } => Self::from_message(name, payload),
        }
    }

    fn from_message(name: &str, payload: &Value) -> Option<Self> {
        debug!(event = name, "received channel event");
        match name {
            EVENT_DEVICE_STATUS => match decode_device_status(payload) {
                Ok(update) => Some(Self::DeviceStatus(update)),
                Err(e) => {
                    warn!(event = name, error = %e, "dropping undecodable payload");
                    None
                }
            },
            EVENT_TASK_STATUS => match TaskUpdate::deserialize(payload) {
                Ok(update) => Some(Self::TaskStatus(update)),
                Err(e) => {
                    warn!(event = name, error = %e, "dropping undecodable payload");
                    None
                }
            },
            EVENT_SERVER_ERROR => {
                let message = payload
                    .get("message")
                    .and_then(Value::as_str)
                    .or_else(|| payload.as_str())
                    .unwrap_or_default()
                    .to_owned();
                Some(Self::ServerError { message })
            }
            EVENT_CONNECTION_STATUS => {
                info!(status = %payload, "server connection status");
                None
            }
            other => {
                debug!(event = other, "ignoring unhandled channel event");
                None
            }
        }
    }
}

#[derive(Deserialize)]
struct RawDeviceStatus {
    #[serde(default)]
    summary: Option<Value>,
    #[serde(default)]
    devices: Option<Value>,
}

/// Decode a device snapshot.
///
/// The summary and the device list are decoded independently, so a bad
/// summary never costs the table. Device entries that cannot be placed
/// (no usable `id`) are dropped; the rest of the snapshot still applies.
fn decode_device_status(payload: &Value) -> Result<DeviceStatusUpdate, serde_json::Error> {
    let raw = RawDeviceStatus::deserialize(payload)?;

    let summary = match raw.summary {
        None | Some(Value::Null) => None,
        Some(value) => match RawSummary::deserialize(value) {
            Ok(summary) => Some(DeviceSummary::from(summary)),
            Err(e) => {
                warn!(error = %e, "ignoring malformed device summary");
                None
            }
        },
    };

    let devices = match raw.devices {
        None | Some(Value::Null) => None,
        Some(Value::Array(entries)) => Some(
            entries
                .into_iter()
                .filter_map(|entry| match Device::deserialize(entry) {
                    Ok(device) => Some(device),
                    Err(e) => {
                        warn!(error = %e, "dropping malformed device entry");
                        None
                    }
                })
                .collect(),
        ),
        Some(other) => {
            warn!(devices = %other, "ignoring non-list device snapshot");
            None
        }
    };

    Ok(DeviceStatusUpdate { summary, devices })
}
