use std::io;
use std::sync::Arc;

use crate::cli::Invocation;
use crate::configs::Settings;
use crate::errors::DispatchError;
use crate::registry::DeviceRegistry;
use crate::services::{CommandDispatcher, RelayClient};

pub mod cli;
pub mod configs;
pub mod errors;
pub mod handles;
pub mod registry;
pub mod services;

pub async fn run(settings: &Arc<Settings>, invocation: Invocation) -> Result<(), DispatchError> {
    let registry = DeviceRegistry::new(settings.devices.clone())?;
    let client = RelayClient::new(&settings.relay);

    let mut dispatcher = CommandDispatcher::new(registry, client, io::stdout(), io::stderr())
        .with_monitor(settings.monitor.clone());

    dispatcher.run(invocation).await
}
