use std::io;

use super::{DeviceError, RelayError};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Relay error: {0}")]
    RelayError(#[from] RelayError),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}
