// ── Device domain types ──

use serde::{Deserialize, Deserializer, Serialize};

use super::id::RecordId;
use super::lenient;
use crate::view::Tone;

/// Rendered in place of a missing `last_checked` timestamp.
pub const NEVER_CHECKED: &str = "-";

/// Reachability of a managed device.
///
/// Anything other than `online`/`offline` (including a missing or null
/// status) is treated as unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(strum::Display, strum::AsRefStr)]
#[serde(from = "Option<String>", into = "String")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl DeviceStatus {
    pub fn tone(self) -> Tone {
        match self {
            Self::Online => Tone::Success,
            Self::Offline => Tone::Danger,
            Self::Unknown => Tone::Warning,
        }
    }
}

impl From<Option<String>> for DeviceStatus {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("online") => Self::Online,
            Some("offline") => Self::Offline,
            _ => Self::Unknown,
        }
    }
}

impl From<DeviceStatus> for String {
    fn from(status: DeviceStatus) -> Self {
        status.as_ref().to_owned()
    }
}

fn lenient_status<'de, D: Deserializer<'de>>(de: D) -> Result<DeviceStatus, D::Error> {
    lenient::opt_string(de).map(DeviceStatus::from)
}

/// One row of the device table, as last reported by the server.
///
/// Only `id` is required; display fields default when null or mistyped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ip_address: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: DeviceStatus,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_checked: Option<String>,
}

impl Device {
    /// `last_checked` for display, falling back to [`NEVER_CHECKED`].
    pub fn last_checked_label(&self) -> &str {
        self.last_checked
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(NEVER_CHECKED)
    }
}

/// Fleet-wide reachability counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub online: u64,
    pub offline: u64,
    pub unknown: u64,
    pub total: u64,
}

/// Wire shape of the summary: absent, null or non-numeric counters count
/// as zero.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSummary {
    #[serde(default, deserialize_with = "lenient::count")]
    online: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    offline: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    unknown: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    total: u64,
}

impl From<RawSummary> for DeviceSummary {
    fn from(raw: RawSummary) -> Self {
        Self {
            online: raw.online,
            offline: raw.offline,
            unknown: raw.unknown,
            total: raw.total,
        }
    }
}

/// A `device_status_update` payload.
///
/// `devices`, when present, is the complete current device set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStatusUpdate {
    pub summary: Option<DeviceSummary>,
    pub devices: Option<Vec<Device>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_and_missing_statuses_collapse_to_unknown() {
        let d: Device = serde_json::from_value(json!({"id": 1, "status": "rebooting"})).unwrap();
        assert_eq!(d.status, DeviceStatus::Unknown);
        let d: Device = serde_json::from_value(json!({"id": 2, "status": null})).unwrap();
        assert_eq!(d.status, DeviceStatus::Unknown);
        let d: Device = serde_json::from_value(json!({"id": 3})).unwrap();
        assert_eq!(d.status, DeviceStatus::Unknown);
    }

    #[test]
    fn null_display_fields_keep_the_device() {
        let d: Device = serde_json::from_value(json!({
            "id": 1,
            "name": null,
            "ip_address": null,
            "status": 3,
            "last_checked": null,
        }))
        .unwrap();
        assert_eq!(d.name, "");
        assert_eq!(d.ip_address, "");
        assert_eq!(d.status, DeviceStatus::Unknown);
        assert_eq!(d.last_checked_label(), NEVER_CHECKED);
    }

    #[test]
    fn status_tones() {
        assert_eq!(DeviceStatus::Online.tone(), Tone::Success);
        assert_eq!(DeviceStatus::Offline.tone(), Tone::Danger);
        assert_eq!(DeviceStatus::Unknown.tone(), Tone::Warning);
    }

    #[test]
    fn missing_last_checked_uses_placeholder() {
        let d: Device = serde_json::from_value(json!({"id": 1, "name": "sw-01"})).unwrap();
        assert_eq!(d.last_checked_label(), NEVER_CHECKED);
        let d: Device =
            serde_json::from_value(json!({"id": 1, "last_checked": "2024-05-01 10:00:00"}))
                .unwrap();
        assert_eq!(d.last_checked_label(), "2024-05-01 10:00:00");
    }

    #[test]
    fn summary_zero_fills_missing_counters() {
        let raw: RawSummary = serde_json::from_value(json!({"online": 3, "offline": 1})).unwrap();
        let summary = DeviceSummary::from(raw);
        assert_eq!(
            summary,
            DeviceSummary {
                online: 3,
                offline: 1,
                unknown: 0,
                total: 0,
            }
        );
    }

    #[test]
    fn summary_tolerates_mistyped_counters() {
        let raw: RawSummary = serde_json::from_value(
            json!({"online": "3", "offline": -1, "unknown": 1.5, "total": null}),
        )
        .unwrap();
        assert_eq!(
            DeviceSummary::from(raw),
            DeviceSummary {
                online: 3,
                offline: 0,
                unknown: 0,
                total: 0,
            }
        );
    }
}
