/// Failure talking to a relay device.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Network failure, timeout or a non-2xx answer
    #[error("{message}")]
    RemoteUnavailable { port: u16, message: String },

    /// The device answered with a body we cannot read a state from
    #[error("malformed response: {message}")]
    MalformedResponse { port: u16, message: String },
}

impl RelayError {
    pub fn unavailable<E: ToString>(port: u16, err: E) -> Self {
        Self::RemoteUnavailable {
            port,
            message: err.to_string(),
        }
    }

    pub fn malformed<E: ToString>(port: u16, err: E) -> Self {
        Self::MalformedResponse {
            port,
            message: err.to_string(),
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            RelayError::RemoteUnavailable { port, .. } => *port,
            RelayError::MalformedResponse { port, .. } => *port,
        }
    }
}
