// Domain model: devices, tasks, and their identities.

pub mod device;
pub mod id;
mod lenient;
pub mod task;

pub use device::{Device, DeviceStatus, DeviceStatusUpdate, DeviceSummary, NEVER_CHECKED};
pub use id::RecordId;
pub use task::{NO_TIMESTAMP, Progress, TaskRow, TaskStatus, TaskUpdate};
