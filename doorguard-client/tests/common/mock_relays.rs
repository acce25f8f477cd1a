use axum::http::StatusCode;
use doorguard_api::DeviceDescriptor;
use doorguard_client::configs::Relay;
use doorguard_client::registry::DeviceRegistry;
use doorguard_client::services::RelayClient;
use doorguard_mock::device::MockRelay;
use doorguard_mock::server::HttpServer;

/// A set of running mock relays and the registry pointing at them.
pub struct MockRelays {
    pub servers: Vec<HttpServer<MockRelay>>,
    pub registry: DeviceRegistry,
}

impl MockRelays {
    /// Start one mock per `(id, name, ison, fault)` on an ephemeral port.
    pub async fn start(specs: &[(&str, &str, bool, Option<StatusCode>)]) -> Self {
        let mut servers = Vec::new();
        let mut devices = Vec::new();

        for (id, name, ison, fault) in specs {
            let mut relay = MockRelay::new(name, *ison);
            if let Some(status) = fault {
                relay = relay.failing(*status);
            }

            let mut server = HttpServer::new(relay, 0);
            let address = server.start().await.unwrap();

            devices.push(DeviceDescriptor::new(*id, address.port(), *name));
            servers.push(server);
        }

        Self {
            servers,
            registry: DeviceRegistry::new(devices).unwrap(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.servers.iter().map(|server| server.request_count()).sum()
    }

    pub async fn stop(mut self) {
        for server in self.servers.iter_mut() {
            server.stop().await;
        }
    }
}

pub fn client() -> RelayClient {
    client_with_timeout(None)
}

pub fn client_with_timeout(timeout_ms: Option<u64>) -> RelayClient {
    RelayClient::new(&Relay {
        host: "127.0.0.1".to_string(),
        timeout_ms,
    })
}
