pub mod command_dispatcher;
pub mod monitor_service;
pub mod relay_service;

pub use command_dispatcher::{CommandDispatcher, ToggleOutcome};
pub use monitor_service::DeviceMonitor;
pub use relay_service::{RelayApi, RelayClient, toggle_device};
