// Reducers for the two data surfaces.

pub mod devices;
pub mod tasks;

pub use devices::{DeviceBoard, DeviceChange};
pub use tasks::{TaskBoard, task_notification};
