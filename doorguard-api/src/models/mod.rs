mod device;
mod monitor;
mod relay;

pub use device::*;
pub use monitor::*;
pub use relay::*;
