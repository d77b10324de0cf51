// ── Device board ──
//
// Holds the last full device snapshot. Every update that carries a device
// list replaces the table wholesale; the summary is replaced independently.

use indexmap::IndexMap;
use tracing::debug;

use crate::model::{Device, DeviceStatusUpdate, DeviceSummary, RecordId};

/// What an update changed, so the view redraws only the touched surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceChange {
    pub summary: bool,
    pub table: bool,
}

impl DeviceChange {
    pub fn is_empty(self) -> bool {
        !self.summary && !self.table
    }
}

#[derive(Debug, Default)]
pub struct DeviceBoard {
    summary: DeviceSummary,
    devices: Vec<Device>,
}

impl DeviceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> &DeviceSummary {
        &self.summary
    }

    /// Current table, in snapshot order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn get(&self, id: &RecordId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// Apply a snapshot.
    ///
    /// Rows not present in the new list disappear. A device id repeated
    /// within one snapshot keeps its first position and its last contents.
    pub fn apply(&mut self, update: DeviceStatusUpdate) -> DeviceChange {
        let mut change = DeviceChange::default();

        if let Some(summary) = update.summary {
            self.summary = summary;
            change.summary = true;
        }

        if let Some(devices) = update.devices {
            let incoming = devices.len();
            let mut by_id: IndexMap<RecordId, Device> = IndexMap::with_capacity(incoming);
            for device in devices {
                by_id.insert(device.id.clone(), device);
            }
            if by_id.len() != incoming {
                debug!(
                    incoming,
                    unique = by_id.len(),
                    "duplicate device ids in snapshot"
                );
            }
            self.devices = by_id.into_values().collect();
            change.table = true;
        }

        change
    }
}
