use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use doorguard_api::{DeviceDescriptor, StatusEvent, WatchedDevice};
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::time::{self, MissedTickBehavior};

use crate::errors::DeviceError;
use crate::services::relay_service::RelayApi;

/// Polls a set of devices and broadcasts every state change.
pub struct DeviceMonitor<A> {
    api: Arc<A>,
    devices: RwLock<Vec<DeviceDescriptor>>,
    /// Last state read per device id
    last_seen: Mutex<HashMap<String, bool>>,
    sender: broadcast::Sender<StatusEvent>,
}

impl<A> DeviceMonitor<A>
where
    A: RelayApi + 'static,
{
    pub fn new(api: Arc<A>, devices: Vec<DeviceDescriptor>) -> Self {
        let (sender, _receiver) = broadcast::channel(100);

        Self {
            api,
            devices: RwLock::new(devices),
            last_seen: Mutex::new(HashMap::new()),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    pub async fn devices(&self) -> Vec<WatchedDevice> {
        let devices = self.devices.read().await;
        let last_seen = self.last_seen.lock().await;

        devices
            .iter()
            .map(|device| WatchedDevice {
                device: device.clone(),
                is_on: last_seen.get(&device.id).copied(),
            })
            .collect()
    }

    /// Start watching a device. Ids are stored uppercase; an entry with the
    /// same id is replaced and its last known state forgotten.
    pub async fn add_device(&self, mut device: DeviceDescriptor) -> Result<(), DeviceError> {
        device.id = device.id.to_uppercase();

        if device.port == 0 {
            return Err(DeviceError::InvalidPort(device.id));
        }

        let mut devices = self.devices.write().await;
        self.last_seen.lock().await.remove(&device.id);

        match devices.iter_mut().find(|watched| watched.id == device.id) {
            Some(watched) => *watched = device,
            None => devices.push(device),
        }

        Ok(())
    }

    pub async fn remove_device(&self, device_id: &str) -> Result<DeviceDescriptor, DeviceError> {
        let device_id = device_id.to_uppercase();
        let mut devices = self.devices.write().await;

        let index = devices
            .iter()
            .position(|device| device.id == device_id)
            .ok_or_else(|| DeviceError::DeviceNotFound(device_id.clone()))?;

        self.last_seen.lock().await.remove(&device_id);

        Ok(devices.remove(index))
    }

    /// Read every watched device once and broadcast the ones whose state
    /// differs from the previous read. The first successful read of a device
    /// always counts as a change.
    pub async fn poll_once(&self) -> Vec<StatusEvent> {
        let devices = self.devices.read().await.clone();

        let readings = join_all(devices.iter().map(|device| async move {
            (device, self.api.get_status(device.port).await)
        }))
        .await;

        let watched = self.devices.read().await;
        let mut last_seen = self.last_seen.lock().await;
        let mut events = Vec::new();

        for (device, reading) in readings {
            let is_on = match reading {
                Ok(is_on) => is_on,
                Err(e) => {
                    tracing::warn!("Error monitoring device {}: {}", device.id, e);
                    continue;
                }
            };

            // Removed or re-registered while the read was in flight
            if !watched.contains(device) {
                continue;
            }

            if last_seen.insert(device.id.clone(), is_on) == Some(is_on) {
                continue;
            }

            let event = StatusEvent {
                device_id: device.id.clone(),
                name: device.name.clone(),
                port: device.port,
                is_on,
            };

            tracing::info!("[{}] ({}) changed, is_on={}", device.name, device.id, is_on);

            // No subscribers is not an error
            let _ = self.sender.send(event.clone());
            events.push(event);
        }

        events
    }

    /// Poll forever, one round per `period`.
    pub async fn run(self: Arc<Self>, period: Duration) {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.poll_once().await;
        }
    }
}
