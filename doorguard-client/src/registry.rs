use doorguard_api::DeviceDescriptor;

use crate::errors::DeviceError;

/// Fixed, ordered set of relay devices known to this process.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceRegistry {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Result<Self, DeviceError> {
        if let Some(device) = devices.iter().find(|device| device.port == 0) {
            return Err(DeviceError::InvalidPort(device.id.clone()));
        }

        Ok(Self { devices })
    }

    /// Exact, case-sensitive match. Ids are stored uppercase so callers
    /// uppercase operator input first.
    pub fn lookup_by_id(&self, id: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|device| device.id == id)
    }

    pub fn lookup_by_port(&self, port: u16) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|device| device.port == port)
    }

    pub fn all(&self) -> &[DeviceDescriptor] {
        &self.devices
    }
}
