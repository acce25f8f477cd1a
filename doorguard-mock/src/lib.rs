use std::io;
use std::net::IpAddr;
use std::sync::Arc;

use crate::device::MockRelay;
use crate::server::HttpServer;
use crate::settings::Settings;

pub mod device;
pub mod server;
pub mod settings;

pub use device::RouteProvider;

/// Serve one mock relay per configured device until Ctrl-C.
pub async fn run(settings: &Arc<Settings>) -> io::Result<()> {
    let host = settings
        .mock
        .host
        .parse::<IpAddr>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut servers = Vec::with_capacity(settings.devices.len());

    for device in &settings.devices {
        let relay = MockRelay::new(&device.name, settings.mock.initial_state);
        let mut server = HttpServer::new(relay, device.port).with_host(host);

        let address = server.start().await?;
        tracing::info!("[{}] ({}) mock relay on {}", device.name, device.id, address);

        servers.push(server);
    }

    tokio::signal::ctrl_c().await?;

    for server in servers.iter_mut() {
        server.stop().await;
    }

    Ok(())
}
