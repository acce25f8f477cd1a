use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Device identifier, stored uppercase
    pub id: String,
    /// Local port the relay device listens on
    pub port: u16,
    /// Display name
    pub name: String,
}

impl DeviceDescriptor {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, port: u16, name: N) -> Self {
        Self {
            id: id.into(),
            port,
            name: name.into(),
        }
    }
}

/// Open/closed reading of a single contact, as reported by its relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayState {
    pub is_on: bool,
}

impl RelayState {
    pub fn label(&self) -> &'static str {
        if self.is_on { "OPEN" } else { "CLOSED" }
    }
}

impl From<bool> for RelayState {
    fn from(is_on: bool) -> Self {
        Self { is_on }
    }
}
