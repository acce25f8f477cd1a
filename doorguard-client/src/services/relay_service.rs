use std::time::Duration;

use async_trait::async_trait;
use doorguard_api::{RelayStatus, Turn, TurnQuery};

use crate::configs::Relay;
use crate::errors::RelayError;

/// Remote operations on a single channel relay addressed by port.
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Read channel 0; `true` means the contact is open.
    async fn get_status(&self, port: u16) -> Result<bool, RelayError>;

    async fn set_state(&self, port: u16, on: bool) -> Result<(), RelayError>;
}

/// Flip a relay based on a fresh read of its state.
///
/// Nothing is sent when the read fails.
pub async fn toggle_device<A: RelayApi + ?Sized>(api: &A, port: u16) -> Result<bool, RelayError> {
    let current = api.get_status(port).await?;
    let new_state = !current;

    api.set_state(port, new_state).await?;

    Ok(new_state)
}

pub struct RelayClient {
    http_client: reqwest::Client,
    host: String,
}

impl RelayClient {
    pub fn new(relay: &Relay) -> Self {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout_ms) = relay.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        let http_client = builder.build().unwrap_or_else(|e| {
            tracing::warn!("falling back to a default HTTP client, relay timeout ignored: {}", e);
            reqwest::Client::default()
        });

        Self {
            http_client,
            host: relay.host.clone(),
        }
    }

    fn url(&self, port: u16, path: &str) -> String {
        format!("http://{}:{}{}", self.host, port, path)
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn get_status(&self, port: u16) -> Result<bool, RelayError> {
        let response = self
            .http_client
            .get(self.url(port, "/status"))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| RelayError::unavailable(port, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| RelayError::unavailable(port, e))?;

        tracing::debug!("status of port {}: {}", port, String::from_utf8_lossy(&body));

        let status: RelayStatus =
            serde_json::from_slice(&body).map_err(|e| RelayError::malformed(port, e))?;

        status
            .primary()
            .map(|relay| relay.ison)
            .ok_or_else(|| RelayError::malformed(port, "no relay channels reported"))
    }

    async fn set_state(&self, port: u16, on: bool) -> Result<(), RelayError> {
        let query = TurnQuery {
            turn: Turn::from(on),
        };

        self.http_client
            .get(self.url(port, "/relay/0"))
            .query(&query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| RelayError::unavailable(port, e))?;

        tracing::debug!("port {} turned {}", port, query.turn.as_str());

        Ok(())
    }
}
