//! Presentation surface driven by the reconciliation loop.
//!
//! The engine never formats output itself: it computes what changed and
//! hands the result to a [`DashboardView`]. Every method defaults to a
//! no-op, so a view only implements the surfaces it actually has; a
//! missing surface simply never receives updates.

use crate::model::{Device, DeviceSummary, TaskRow};

/// Visual tone of a badge or status cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Tone {
    Success,
    Danger,
    Warning,
    Info,
    Primary,
    Secondary,
}

/// A labelled, toned indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub tone: Tone,
    pub label: String,
}

impl Badge {
    pub fn new(tone: Tone, label: impl Into<String>) -> Self {
        Self {
            tone,
            label: label.into(),
        }
    }
}

/// State of the form's submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    pub enabled: bool,
    pub busy: bool,
    pub label: &'static str,
}

/// How a task update landed in the task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// First sighting: the row goes to the top of the table.
    Inserted(TaskRow),
    /// An existing row changed in place.
    Updated(TaskRow),
}

impl TaskChange {
    pub fn row(&self) -> &TaskRow {
        match self {
            Self::Inserted(row) | Self::Updated(row) => row,
        }
    }
}

pub trait DashboardView {
    fn connection_badge(&mut self, _badge: &Badge) {}

    fn device_summary(&mut self, _summary: &DeviceSummary) {}

    /// Called once per snapshot with the full, already deduplicated table.
    fn device_table(&mut self, _devices: &[Device]) {}

    fn task_row(&mut self, _change: &TaskChange) {}

    fn submit_button(&mut self, _button: &SubmitButton) {}

    fn form_reset(&mut self) {}
}

/// A view with no surfaces at all.
impl DashboardView for () {}
