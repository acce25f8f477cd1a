use serde::{Deserialize, Serialize};

use super::DeviceDescriptor;

/// Pushed to watchers whenever a device reports a state different from the
/// last one seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub device_id: String,
    pub name: String,
    pub port: u16,
    pub is_on: bool,
}

/// A watched device and the last state read from it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedDevice {
    #[serde(flatten)]
    pub device: DeviceDescriptor,
    pub is_on: Option<bool>,
}
