// netdash-core: Reconciliation engine between the event channel, the
// submit endpoint, and whatever renders the dashboard.

pub mod bridge;
pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod event;
pub mod form;
pub mod model;
pub mod notify;
pub mod store;
pub mod submit;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{EventChannel, bridge_channel};
pub use config::{DashboardConfig, TlsVerification};
pub use connection::{ConnectionIndicator, ConnectionSignal, ConnectionState};
pub use engine::{Dashboard, event_channel};
pub use error::CoreError;
pub use event::DashboardEvent;
pub use form::{DhcpForm, FormController, FormPhase, Resolution};
pub use model::{
    Device, DeviceStatus, DeviceStatusUpdate, DeviceSummary, Progress, RecordId, TaskRow,
    TaskStatus, TaskUpdate,
};
pub use notify::{Notification, NotificationLevel, NotificationSink, RecordingSink};
pub use store::{DeviceBoard, TaskBoard};
pub use submit::{SubmitFailure, Submitter};
pub use view::{Badge, DashboardView, SubmitButton, TaskChange, Tone};

pub use netdash_api::{ChannelEvent, DhcpRequest, RealtimeHandle, ReconnectConfig, SubmitReceipt};
