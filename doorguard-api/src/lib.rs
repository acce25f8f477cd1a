pub mod models;

pub use models::{
    DeviceDescriptor, RelayEntry, RelayState, RelayStatus, StatusEvent, Turn, TurnQuery,
    WatchedDevice,
};
