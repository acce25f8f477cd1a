use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use doorguard_api::{DeviceDescriptor, RelayState, StatusEvent};
use futures::future::join_all;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::{Command, Invocation};
use crate::configs::Monitor;
use crate::errors::{DeviceError, DispatchError, RelayError};
use crate::handles::monitor_router;
use crate::registry::DeviceRegistry;
use crate::services::monitor_service::DeviceMonitor;
use crate::services::relay_service::{RelayApi, toggle_device};

const SEPARATOR: &str = "------------------------";

/// Result of toggling a single device.
#[derive(Debug)]
pub struct ToggleOutcome {
    pub port: u16,
    pub result: Result<bool, RelayError>,
}

/// Maps operator commands onto relay calls and writes the report.
///
/// Relay failures are reported per device and never abort the command.
pub struct CommandDispatcher<A, O, E> {
    registry: DeviceRegistry,
    api: Arc<A>,
    monitor: Monitor,
    out: O,
    err: E,
}

impl<A, O, E> CommandDispatcher<A, O, E>
where
    A: RelayApi + 'static,
    O: Write,
    E: Write,
{
    pub fn new(registry: DeviceRegistry, api: A, out: O, err: E) -> Self {
        Self {
            registry,
            api: Arc::new(api),
            monitor: Monitor::default(),
            out,
            err,
        }
    }

    /// Where `watch` listens and how often it polls.
    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// Run one invocation. Only I/O failures are returned; device and
    /// relay failures have already been reported by the time this returns.
    pub async fn run(&mut self, invocation: Invocation) -> Result<(), DispatchError> {
        let result = match invocation {
            Invocation::Run(Command::Status) => self.print_all_statuses().await.map(|_| ()),
            Invocation::Run(Command::All) => self.toggle_all().await.map(|_| ()),
            Invocation::Run(Command::Toggle { device }) => self.toggle(&device).await.map(|_| ()),
            Invocation::Run(Command::Watch) => {
                self.watch(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("failed to listen for ctrl-c: {}", e);
                    }
                })
                .await
            }
            Invocation::Usage => self.print_usage(),
            Invocation::Invalid => {
                writeln!(self.err, "Invalid command or device")?;
                self.print_usage()
            }
        };

        match result {
            Err(DispatchError::IoError(e)) => Err(DispatchError::IoError(e)),
            Err(e) => {
                tracing::debug!("command finished with {}", e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Read every device in order, one at a time. Devices that cannot be
    /// read are left out of the table.
    pub async fn print_all_statuses(
        &mut self,
    ) -> Result<Vec<(DeviceDescriptor, RelayState)>, DispatchError> {
        writeln!(self.out, "\nCurrent Device Statuses:")?;
        writeln!(self.out, "{SEPARATOR}")?;

        let mut readings = Vec::new();

        for device in self.registry.all() {
            match self.api.get_status(device.port).await {
                Ok(is_on) => {
                    let state = RelayState::from(is_on);
                    writeln!(self.out, "[{}] ({}): {}", device.name, device.id, state.label())?;
                    readings.push((device.clone(), state));
                }
                Err(e) => {
                    writeln!(
                        self.err,
                        "Error getting status for device on port {}: {}",
                        device.port, e
                    )?;
                }
            }
        }

        writeln!(self.out, "{SEPARATOR}\n")?;

        Ok(readings)
    }

    /// Toggle every device concurrently and wait for all of them. Nothing
    /// is reported until every toggle has finished; the result lines then
    /// print in registry order, not completion order.
    pub async fn toggle_all(&mut self) -> Result<Vec<ToggleOutcome>, DispatchError> {
        writeln!(self.out, "Toggling all devices...")?;

        let api = self.api.as_ref();
        let toggles = self.registry.all().iter().map(|device| async move {
            ToggleOutcome {
                port: device.port,
                result: toggle_device(api, device.port).await,
            }
        });

        let outcomes = join_all(toggles).await;

        for outcome in &outcomes {
            self.report_toggle(outcome.port, &outcome.result)?;
        }

        Ok(outcomes)
    }

    /// Toggle a single device by operator-supplied id.
    pub async fn toggle(&mut self, device_id: &str) -> Result<bool, DispatchError> {
        let device_id = device_id.to_uppercase();

        let Some(port) = self.registry.lookup_by_id(&device_id).map(|device| device.port) else {
            writeln!(self.err, "Device {device_id} not found")?;
            return Err(DeviceError::DeviceNotFound(device_id).into());
        };

        let result = toggle_device(self.api.as_ref(), port).await;
        self.report_toggle(port, &result)?;

        Ok(result?)
    }

    /// Poll every device, serve the watch API and print each change until
    /// `shutdown` resolves.
    pub async fn watch<F>(&mut self, shutdown: F) -> Result<(), DispatchError>
    where
        F: Future<Output = ()>,
    {
        let monitor = Arc::new(DeviceMonitor::new(
            self.api.clone(),
            self.registry.all().to_vec(),
        ));
        let mut events = monitor.subscribe();

        let listener = TcpListener::bind((self.monitor.host.as_str(), self.monitor.port)).await?;
        let address = listener.local_addr()?;

        tracing::info!("listening on {:?}", address);

        let period = Duration::from_millis(self.monitor.interval_ms.max(1));
        let poller = tokio::spawn(monitor.clone().run(period));
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, monitor_router(monitor)).await {
                tracing::error!("watch server stopped: {}", e);
            }
        });

        let result = self.print_events(&mut events, address, shutdown).await;

        poller.abort();
        server.abort();

        result
    }

    async fn print_events<F>(
        &mut self,
        events: &mut broadcast::Receiver<StatusEvent>,
        address: SocketAddr,
        shutdown: F,
    ) -> Result<(), DispatchError>
    where
        F: Future<Output = ()>,
    {
        writeln!(
            self.out,
            "Watching {} devices, events on ws://{}/ws",
            self.registry.all().len(),
            address
        )?;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        writeln!(
                            self.out,
                            "[{}] ({}): {}",
                            event.name,
                            event.device_id,
                            RelayState::from(event.is_on).label()
                        )?;
                        self.out.flush()?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("{} device changes were not printed", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        Ok(())
    }

    pub fn print_usage(&mut self) -> Result<(), DispatchError> {
        writeln!(self.out, "\nUsage:")?;
        writeln!(self.out, "doorguard [command] [device]")?;
        writeln!(self.out, "\nCommands:")?;
        writeln!(self.out, "  toggle [device] - Toggle a specific device")?;
        writeln!(self.out, "  status          - Show status of all devices")?;
        writeln!(self.out, "  all             - Toggle all devices")?;
        writeln!(self.out, "  watch           - Watch devices and stream changes")?;
        writeln!(self.out, "\nDevices:")?;

        for device in self.registry.all() {
            writeln!(self.out, "  {} - {} (port {})", device.id, device.name, device.port)?;
        }

        Ok(())
    }

    fn report_toggle(&mut self, port: u16, result: &Result<bool, RelayError>) -> Result<(), DispatchError> {
        match result {
            Ok(new_state) => {
                let name = self
                    .registry
                    .lookup_by_port(port)
                    .map(|device| device.name.as_str())
                    .unwrap_or("unknown");

                writeln!(
                    self.out,
                    "[{}] Status changed to {}",
                    name,
                    RelayState::from(*new_state).label()
                )?;
            }
            Err(e) => {
                writeln!(self.err, "Error toggling device on port {}: {}", port, e)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// In-memory relays; ports without a state answer like a broken device.
    #[derive(Default)]
    struct FakeRelays {
        states: Mutex<HashMap<u16, bool>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRelays {
        fn with(states: &[(u16, bool)]) -> Self {
            Self {
                states: Mutex::new(states.iter().copied().collect()),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RelayApi for FakeRelays {
        async fn get_status(&self, port: u16) -> Result<bool, RelayError> {
            self.calls.lock().unwrap().push(format!("{port} /status"));
            self.states
                .lock()
                .unwrap()
                .get(&port)
                .copied()
                .ok_or_else(|| RelayError::unavailable(port, "HTTP status server error (500)"))
        }

        async fn set_state(&self, port: u16, on: bool) -> Result<(), RelayError> {
            let turn = if on { "on" } else { "off" };
            self.calls.lock().unwrap().push(format!("{port} /relay/0?turn={turn}"));
            self.states.lock().unwrap().insert(port, on);
            Ok(())
        }
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::new(vec![
            DeviceDescriptor::new("ABC123", 8086, "Bedroom 1"),
            DeviceDescriptor::new("DEF456", 8087, "Bedroom 2"),
        ])
        .unwrap()
    }

    fn dispatcher(relays: FakeRelays) -> CommandDispatcher<FakeRelays, Vec<u8>, Vec<u8>> {
        CommandDispatcher::new(registry(), relays, Vec::new(), Vec::new())
    }

    fn text(buffer: &[u8]) -> String {
        String::from_utf8_lossy(buffer).into_owned()
    }

    fn device_lines(output: &str) -> Vec<&str> {
        output.lines().filter(|line| line.starts_with('[')).collect()
    }

    #[tokio::test]
    async fn test_status_lists_healthy_devices_in_order() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8086, true), (8087, false)]));

        let readings = dispatcher.print_all_statuses().await.unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(
            device_lines(&text(&dispatcher.out)),
            ["[Bedroom 1] (ABC123): OPEN", "[Bedroom 2] (DEF456): CLOSED"]
        );
        assert_eq!(dispatcher.api.calls(), ["8086 /status", "8087 /status"]);
    }

    #[tokio::test]
    async fn test_status_omits_failed_device() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8087, false)]));

        dispatcher.run(Invocation::Run(Command::Status)).await.unwrap();

        let out = text(&dispatcher.out);
        assert_eq!(device_lines(&out), ["[Bedroom 2] (DEF456): CLOSED"]);
        assert!(out.contains("Current Device Statuses:"));
        assert!(text(&dispatcher.err).contains("Error getting status for device on port 8086"));
    }

    #[tokio::test]
    async fn test_toggle_unknown_device_sends_nothing() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8086, false)]));

        let result = dispatcher.toggle("unknownid").await;

        assert!(matches!(
            result,
            Err(DispatchError::DeviceError(DeviceError::DeviceNotFound(id))) if id == "UNKNOWNID"
        ));
        assert!(dispatcher.api.calls().is_empty());
        assert_eq!(text(&dispatcher.err).trim(), "Device UNKNOWNID not found");
        assert!(dispatcher.out.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_uppercases_id() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8086, false)]));

        let new_state = dispatcher.toggle("abc123").await.unwrap();

        assert!(new_state);
        assert_eq!(dispatcher.api.calls(), ["8086 /status", "8086 /relay/0?turn=on"]);
        assert_eq!(text(&dispatcher.out).trim(), "[Bedroom 1] Status changed to OPEN");
    }

    #[tokio::test]
    async fn test_toggle_open_device_closes_it() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8087, true)]));

        assert!(!dispatcher.toggle("DEF456").await.unwrap());
        assert_eq!(dispatcher.api.calls(), ["8087 /status", "8087 /relay/0?turn=off"]);
    }

    #[tokio::test]
    async fn test_toggle_failure_is_reported_not_raised() {
        let mut dispatcher = dispatcher(FakeRelays::default());

        dispatcher
            .run(Invocation::Run(Command::Toggle {
                device: "ABC123".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(dispatcher.api.calls(), ["8086 /status"]);
        assert!(text(&dispatcher.err).contains("Error toggling device on port 8086"));
        assert!(dispatcher.out.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_all_collects_every_outcome() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8086, false)]));

        let outcomes = dispatcher.toggle_all().await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].port, 8086);
        assert!(matches!(outcomes[0].result, Ok(true)));
        assert_eq!(outcomes[1].port, 8087);
        assert!(matches!(outcomes[1].result, Err(RelayError::RemoteUnavailable { port: 8087, .. })));

        let out = text(&dispatcher.out);
        assert!(out.starts_with("Toggling all devices..."));
        assert_eq!(device_lines(&out), ["[Bedroom 1] Status changed to OPEN"]);
        assert!(text(&dispatcher.err).contains("Error toggling device on port 8087"));
    }

    #[tokio::test]
    async fn test_usage_lists_devices_without_network() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8086, false)]));

        dispatcher.run(Invocation::Usage).await.unwrap();

        let out = text(&dispatcher.out);
        assert!(out.contains("  status          - Show status of all devices"));
        assert!(out.contains("  ABC123 - Bedroom 1 (port 8086)"));
        assert!(out.contains("  DEF456 - Bedroom 2 (port 8087)"));
        assert!(dispatcher.err.is_empty());
        assert!(dispatcher.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_command_prints_error_and_usage() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8086, false)]));

        dispatcher.run(Invocation::Invalid).await.unwrap();

        assert_eq!(text(&dispatcher.err).trim(), "Invalid command or device");
        assert!(text(&dispatcher.out).contains("Usage:"));
        assert!(dispatcher.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_watch_prints_changes_until_shutdown() {
        let mut dispatcher = dispatcher(FakeRelays::with(&[(8086, true), (8087, false)]))
            .with_monitor(Monitor {
                host: "127.0.0.1".to_string(),
                port: 0,
                interval_ms: 10,
            });

        dispatcher
            .watch(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        let out = text(&dispatcher.out);
        assert!(out.starts_with("Watching 2 devices, events on ws://127.0.0.1:"));
        assert_eq!(
            device_lines(&out),
            ["[Bedroom 1] (ABC123): OPEN", "[Bedroom 2] (DEF456): CLOSED"]
        );
        assert!(dispatcher.err.is_empty());
    }

    #[tokio::test]
    async fn test_watch_reports_bind_failure() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let mut dispatcher = dispatcher(FakeRelays::default()).with_monitor(Monitor {
            host: "127.0.0.1".to_string(),
            port,
            interval_ms: 10,
        });

        let result = dispatcher.watch(std::future::pending()).await;

        assert!(matches!(result, Err(DispatchError::IoError(_))));
        assert!(dispatcher.api.calls().is_empty());
    }
}
