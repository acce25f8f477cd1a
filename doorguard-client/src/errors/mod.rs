pub mod device;
pub mod dispatch;
pub mod relay;

pub use device::DeviceError;
pub use dispatch::DispatchError;
pub use relay::RelayError;
