pub mod monitor_handle;

pub use monitor_handle::monitor_router;
